//! Transport adapter.
//!
//! A [`Transport`] owns one WebSocket connection bound to a URL and runs a
//! blocking event loop that dispatches lifecycle events (open, message,
//! close, error) into an [`EventHandler`]. [`TungsteniteTransport`] is the
//! production implementation on top of `tokio-tungstenite`.

use std::fmt;
use std::future::pending;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as TungsteniteError, Message};
use tracing::{debug, warn};

use super::config::TransportOptions;
use super::error::WsError;

/// Close code and reason reported with a close event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code, if the peer sent one.
    pub code: Option<u16>,
    /// Close reason text (may be empty).
    pub reason: String,
}

impl CloseReason {
    /// Creates a close reason without a code.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
        }
    }

    /// Creates a close reason with a code.
    #[must_use]
    pub fn with_code(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
        }
    }

    fn from_frame(frame: &CloseFrame) -> Self {
        Self::with_code(u16::from(frame.code), frame.reason.as_str())
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.reason.is_empty()) {
            (Some(code), true) => write!(f, "code: {}", code),
            (Some(code), false) => write!(f, "{} (code: {})", self.reason, code),
            (None, _) => write!(f, "{}", self.reason),
        }
    }
}

/// Outbound half of a connection, shareable across threads.
pub trait Connection: Send + Sync {
    /// Queues a text frame. Fire and forget.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection has been closed.
    fn send(&self, text: &str) -> Result<(), WsError>;

    /// Requests termination of the connection.
    ///
    /// Idempotent and safe to call from any thread, before or during `run`.
    fn close(&self);
}

/// Receiver of connection lifecycle events.
///
/// Handlers are invoked synchronously from the event loop and must not block.
pub trait EventHandler {
    /// The connection is open.
    fn on_open(&self, conn: &dyn Connection);

    /// A text frame arrived.
    fn on_message(&self, conn: &dyn Connection, text: &str);

    /// The connection is closed. No further events follow.
    fn on_close(&self, conn: &dyn Connection, reason: Option<&CloseReason>);

    /// The transport reported a failure. A close event may follow.
    fn on_error(&self, conn: &dyn Connection, error: &WsError);
}

/// A connection with a blocking event loop.
pub trait Transport: Connection {
    /// Runs the event loop on the calling thread until the connection closes.
    fn run(&self, handler: &dyn EventHandler);
}

/// WebSocket transport backed by `tokio-tungstenite`.
///
/// The event loop runs on a current-thread tokio runtime created by
/// [`Transport::run`], so the caller must not already be inside a runtime.
#[derive(Debug)]
pub struct TungsteniteTransport {
    options: TransportOptions,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    close_requested: AtomicBool,
    close_notify: Notify,
}

impl TungsteniteTransport {
    /// Creates a transport with the given options. Does not connect.
    #[must_use]
    pub fn new(options: TransportOptions) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            options,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            close_requested: AtomicBool::new(false),
            close_notify: Notify::new(),
        }
    }

    /// Creates a transport for the given URL with default options.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(TransportOptions::new(url))
    }

    /// Returns the URL this transport is bound to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.options.url
    }

    /// Returns true once a close has been requested or the loop has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }

    fn take_outbound(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        match self.outbound_rx.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    async fn drive(
        &self,
        mut outbound: mpsc::UnboundedReceiver<String>,
        handler: &dyn EventHandler,
    ) {
        let url = self.options.url.as_str();
        debug!(url, "Connecting");

        let connected = tokio::select! {
            biased;
            () = self.close_notify.notified() => None,
            result = tokio_tungstenite::connect_async(url) => Some(result),
        };

        let stream = match connected {
            Some(Ok((stream, _response))) => stream,
            Some(Err(e)) => {
                self.close_requested.store(true, Ordering::Release);
                handler.on_error(self, &WsError::Connection(e.to_string()));
                handler.on_close(self, None);
                return;
            }
            None => {
                debug!(url, "Close requested while connecting");
                handler.on_close(self, None);
                return;
            }
        };

        let (mut sink, mut source) = stream.split();
        handler.on_open(self);

        let mut heartbeat = self.options.ping_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut close_deadline: Option<Instant> = None;
        let mut reason: Option<CloseReason> = None;

        loop {
            if close_deadline.is_none() && self.close_requested.load(Ordering::Acquire) {
                close_deadline = Some(Instant::now() + self.options.close_timeout);

                // Frames accepted by `send` go out ahead of the close frame.
                while let Ok(text) = outbound.try_recv() {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        handler.on_error(self, &WsError::SendFailed(e.to_string()));
                        break;
                    }
                }

                debug!(url, "Sending close frame");
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!(url, error = %e, "Close frame not sent");
                    break;
                }
            }

            tokio::select! {
                biased;
                () = self.close_notify.notified(), if close_deadline.is_none() => {}
                Some(text) = outbound.recv(), if close_deadline.is_none() => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        handler.on_error(self, &WsError::SendFailed(e.to_string()));
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => handler.on_message(self, text.as_str()),
                    Some(Ok(Message::Binary(data))) => {
                        handler.on_message(self, &String::from_utf8_lossy(&data));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        reason = frame.as_ref().map(CloseReason::from_frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(
                        TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed,
                    )) => break,
                    Some(Err(e)) => {
                        if close_deadline.is_none() {
                            handler.on_error(self, &WsError::from(e));
                        } else {
                            debug!(url, error = %e, "Error during close handshake");
                        }
                        break;
                    }
                    None => break,
                },
                () = tick(&mut heartbeat), if close_deadline.is_none() => {
                    if let Err(e) = sink.send(Message::Ping(Default::default())).await {
                        debug!(url, error = %e, "Heartbeat ping not sent");
                    }
                }
                () = expire(close_deadline) => {
                    debug!(url, "Close handshake timed out");
                    break;
                }
            }
        }

        self.close_requested.store(true, Ordering::Release);

        let mut undelivered = 0usize;
        while outbound.try_recv().is_ok() {
            undelivered += 1;
        }
        if undelivered > 0 {
            handler.on_error(
                self,
                &WsError::SendFailed(format!(
                    "{} queued frame(s) not written before the connection closed",
                    undelivered
                )),
            );
        }

        if tokio::time::timeout(self.options.close_timeout, sink.close())
            .await
            .is_err()
        {
            debug!(url, "Timed out flushing close frame");
        }

        handler.on_close(self, reason.as_ref());
    }
}

impl Connection for TungsteniteTransport {
    fn send(&self, text: &str) -> Result<(), WsError> {
        if self.is_closed() {
            return Err(WsError::Closed);
        }

        self.outbound_tx
            .send(text.to_owned())
            .map_err(|_| WsError::Closed)
    }

    fn close(&self) {
        if !self.close_requested.swap(true, Ordering::AcqRel) {
            debug!(url = %self.options.url, "Close requested");
            self.close_notify.notify_one();
        }
    }
}

impl Transport for TungsteniteTransport {
    fn run(&self, handler: &dyn EventHandler) {
        let Some(outbound) = self.take_outbound() else {
            warn!(url = %self.options.url, "Event loop already ran, connection cannot be reused");
            return;
        };

        if self.is_closed() {
            handler.on_close(self, None);
            return;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                self.close_requested.store(true, Ordering::Release);
                handler.on_error(self, &WsError::Runtime(e.to_string()));
                handler.on_close(self, None);
                return;
            }
        };

        runtime.block_on(self.drive(outbound, handler));
    }
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().expect("lock").clone()
        }

        fn push(&self, event: String) {
            self.events.lock().expect("lock").push(event);
        }
    }

    impl EventHandler for Recorder {
        fn on_open(&self, _conn: &dyn Connection) {
            self.push("open".to_string());
        }

        fn on_message(&self, _conn: &dyn Connection, text: &str) {
            self.push(format!("message:{}", text));
        }

        fn on_close(&self, _conn: &dyn Connection, _reason: Option<&CloseReason>) {
            self.push("close".to_string());
        }

        fn on_error(&self, _conn: &dyn Connection, _error: &WsError) {
            self.push("error".to_string());
        }
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::with_code(1000, "bye").to_string(), "bye (code: 1000)");
        assert_eq!(CloseReason::with_code(1001, "").to_string(), "code: 1001");
        assert_eq!(CloseReason::new("gone").to_string(), "gone");
    }

    #[test]
    fn test_transport_url() {
        let transport = TungsteniteTransport::with_url("ws://localhost:8080");
        assert_eq!(transport.url(), "ws://localhost:8080");
        assert!(!transport.is_closed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let transport = TungsteniteTransport::with_url("ws://localhost:8080");
        transport.close();
        transport.close();
        assert!(transport.is_closed());
    }

    #[test]
    fn test_send_after_close_fails() {
        let transport = TungsteniteTransport::with_url("ws://localhost:8080");
        assert!(transport.send("queued").is_ok());
        transport.close();
        assert_eq!(transport.send("late"), Err(WsError::Closed));
    }

    #[test]
    fn test_run_after_close_delivers_only_close() {
        let transport = TungsteniteTransport::with_url("ws://localhost:8080");
        let recorder = Recorder::default();

        transport.close();
        transport.run(&recorder);

        assert_eq!(recorder.events(), vec!["close".to_string()]);
    }

    #[test]
    fn test_run_twice_delivers_nothing_the_second_time() {
        let transport = TungsteniteTransport::with_url("ws://localhost:8080");
        let recorder = Recorder::default();

        transport.close();
        transport.run(&recorder);
        transport.run(&recorder);

        assert_eq!(recorder.events(), vec!["close".to_string()]);
    }

    #[test]
    fn test_invalid_url_reports_error_then_close() {
        let transport = TungsteniteTransport::with_url("not a websocket url");
        let recorder = Recorder::default();

        transport.run(&recorder);

        assert_eq!(
            recorder.events(),
            vec!["error".to_string(), "close".to_string()]
        );
        assert!(transport.is_closed());
    }
}
