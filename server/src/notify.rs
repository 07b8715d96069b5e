//! PostgreSQL notification listener.
//!
//! Each insert into `http_response` fires a trigger that calls `pg_notify`
//! with a comma separated payload `node_tag,src_ip,src_port,code`. The
//! listener forwards the raw payload to every connected client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgListener;
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::state::AppState;

/// Pause before retrying after a failed receive.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// A parsed `http_response_inserted` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseNotice {
    /// Node tag, e.g. `Node-3`.
    pub node_tag: String,
    /// Source IP.
    pub src_ip: String,
    /// Source port.
    pub src_port: String,
    /// HTTP status code.
    pub code: String,
}

/// Payload parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoticeError {
    /// Wrong number of comma separated fields.
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),
}

impl FromStr for HttpResponseNotice {
    type Err = NoticeError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = payload.split(',').map(str::trim).collect();

        match fields.as_slice() {
            [node_tag, src_ip, src_port, code] => Ok(Self {
                node_tag: (*node_tag).to_string(),
                src_ip: (*src_ip).to_string(),
                src_port: (*src_port).to_string(),
                code: (*code).to_string(),
            }),
            _ => Err(NoticeError::FieldCount(fields.len())),
        }
    }
}

impl fmt::Display for HttpResponseNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.node_tag, self.src_ip, self.src_port, self.code
        )
    }
}

/// Logs a notification payload and forwards it to every client.
///
/// Malformed payloads are still forwarded. Returns the number of clients
/// the payload was queued for.
pub fn forward_payload(state: &AppState, payload: &str) -> usize {
    state.metrics.record_notification();
    info!("Received notification from PostgreSQL: {}", payload);

    match payload.parse::<HttpResponseNotice>() {
        Ok(notice) => debug!(
            node_tag = %notice.node_tag,
            src_ip = %notice.src_ip,
            src_port = %notice.src_port,
            code = %notice.code,
            "Parsed notification"
        ),
        Err(e) => warn!("Malformed notification payload {:?}: {}", payload, e),
    }

    let delivered = state.broadcast(payload);
    if delivered == 0 {
        debug!("No clients connected, notification dropped");
    }
    delivered
}

/// Listens on one PostgreSQL channel and forwards its notifications.
pub struct NotificationListener {
    listener: PgListener,
    channel: String,
    state: AppState,
}

impl fmt::Debug for NotificationListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationListener")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl NotificationListener {
    /// Connects and issues `LISTEN` on `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the `LISTEN` fails.
    pub async fn connect(
        database_url: &str,
        channel: &str,
        state: AppState,
    ) -> Result<Self, ServerError> {
        let mut listener = PgListener::connect(database_url).await?;
        listener.listen(channel).await?;
        info!("Listening for PostgreSQL notifications on {}", channel);

        Ok(Self {
            listener,
            channel: channel.to_string(),
            state,
        })
    }

    /// Returns the channel being listened on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Forwards notifications until the stop signal fires.
    pub async fn run(mut self) {
        let stop = self.state.stop.clone();

        loop {
            tokio::select! {
                received = self.listener.recv() => match received {
                    Ok(notification) if notification.channel() == self.channel => {
                        forward_payload(&self.state, notification.payload());
                    }
                    Ok(notification) => {
                        debug!("Ignoring notification on {}", notification.channel());
                    }
                    Err(e) => {
                        error!("Notification listener error: {}", e);
                        tokio::select! {
                            () = tokio::time::sleep(RETRY_DELAY) => {}
                            () = stop.triggered() => break,
                        }
                    }
                },
                () = stop.triggered() => break,
            }
        }

        info!("Notification listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notice() {
        let notice: HttpResponseNotice = "Node-3,192.168.1.20,8080,404".parse().expect("notice");
        assert_eq!(notice.node_tag, "Node-3");
        assert_eq!(notice.src_ip, "192.168.1.20");
        assert_eq!(notice.src_port, "8080");
        assert_eq!(notice.code, "404");
        assert_eq!(notice.to_string(), "Node-3,192.168.1.20,8080,404");
    }

    #[test]
    fn test_parse_notice_wrong_field_count() {
        assert_eq!(
            "Node-3,192.168.1.20".parse::<HttpResponseNotice>(),
            Err(NoticeError::FieldCount(2))
        );
        assert_eq!(
            "a,b,c,d,e".parse::<HttpResponseNotice>(),
            Err(NoticeError::FieldCount(5))
        );
    }

    #[tokio::test]
    async fn test_forward_payload_reaches_clients() {
        let state = AppState::default();
        let mut rx = state.subscribe();

        assert_eq!(forward_payload(&state, "Node-1,192.168.0.1,1000,200"), 1);
        assert_eq!(
            rx.recv().await.ok().as_deref(),
            Some("Node-1,192.168.0.1,1000,200")
        );
        assert_eq!(state.metrics.notifications(), 1);
    }

    #[tokio::test]
    async fn test_forward_malformed_payload_still_sent() {
        let state = AppState::default();
        let mut rx = state.subscribe();

        assert_eq!(forward_payload(&state, "garbage"), 1);
        assert_eq!(rx.recv().await.ok().as_deref(), Some("garbage"));
    }

    #[test]
    fn test_forward_payload_without_clients() {
        let state = AppState::default();
        assert_eq!(forward_payload(&state, "Node-1,192.168.0.1,1000,200"), 0);
        assert_eq!(state.metrics.notifications(), 1);
    }
}
