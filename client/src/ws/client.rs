//! WebSocket client implementation.
//!
//! The client announces its identity and subscribes to one channel as soon
//! as the transport opens, then logs every inbound message until the
//! connection closes.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::config::ClientConfig;
use super::error::WsError;
use super::messages::ClientMessage;
use super::transport::{CloseReason, Connection, EventHandler, Transport, TungsteniteTransport};
use crate::identity::ClientId;
use crate::sink::LogSink;

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientState {
    /// Constructed, event loop not yet open.
    Init = 0,
    /// Connection open.
    Open = 1,
    /// The transport reported an error; a close may follow.
    Error = 2,
    /// Connection closed. Terminal.
    Closed = 3,
}

impl ClientState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Init,
            1 => Self::Open,
            2 => Self::Error,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Open => write!(f, "open"),
            Self::Error => write!(f, "error"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Handle for closing a client's connection from another thread.
#[derive(Clone)]
pub struct CloseHandle {
    connection: Arc<dyn Connection>,
}

impl CloseHandle {
    /// Requests termination of the connection. Idempotent.
    pub fn close(&self) {
        self.connection.close();
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle").finish_non_exhaustive()
    }
}

/// Single-connection WebSocket client.
pub struct WebSocketClient<T: Transport + 'static = TungsteniteTransport> {
    client_id: ClientId,
    channel: String,
    transport: Arc<T>,
    sink: Arc<dyn LogSink>,
    log_outbound: bool,
    state: AtomicU8,
}

impl WebSocketClient<TungsteniteTransport> {
    /// Creates a client for the configured server. Does not connect.
    ///
    /// Invalid URLs are not rejected here; they surface as an error event
    /// once [`run`](Self::run) is called.
    #[must_use]
    pub fn new(config: &ClientConfig, sink: Arc<dyn LogSink>) -> Self {
        let transport = TungsteniteTransport::new(config.transport_options());
        Self::with_transport(transport, config.channel.clone(), sink)
            .with_outbound_logging(config.log_outbound)
    }

    /// Creates a client for the given URL with the default channel.
    #[must_use]
    pub fn with_url(url: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self::new(&ClientConfig::new(url), sink)
    }
}

impl<T: Transport + 'static> WebSocketClient<T> {
    /// Creates a client driving the given transport.
    #[must_use]
    pub fn with_transport(
        transport: T,
        channel: impl Into<String>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            client_id: ClientId::generate(),
            channel: channel.into(),
            transport: Arc::new(transport),
            sink,
            log_outbound: false,
            state: AtomicU8::new(ClientState::Init as u8),
        }
    }

    /// Enables or disables logging of outbound frames.
    #[must_use]
    pub fn with_outbound_logging(mut self, enabled: bool) -> Self {
        self.log_outbound = enabled;
        self
    }

    /// Returns this client's identity.
    #[must_use]
    pub const fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the subscription channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ClientState {
        ClientState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the event loop on the calling thread.
    ///
    /// Blocks until the connection is closed, locally or by the peer.
    /// Transport failures are logged, never returned.
    pub fn run(&self) {
        self.transport.run(self);
    }

    /// Requests termination of the connection.
    ///
    /// Idempotent, safe to call before [`run`](Self::run) and from any thread.
    pub fn close(&self) {
        self.transport.close();
    }

    /// Returns a handle that can close this client from another thread.
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle {
        let connection: Arc<dyn Connection> = Arc::<T>::clone(&self.transport);
        CloseHandle { connection }
    }

    /// Moves to `next` unless the client is already closed.
    ///
    /// Returns false when the event must be ignored.
    fn transition(&self, next: ClientState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ClientState::Closed as u8).then_some(next as u8)
            })
            .is_ok()
    }

    fn send_message(&self, conn: &dyn Connection, message: &ClientMessage) {
        let result = message.to_json().and_then(|json| {
            conn.send(&json)?;
            Ok(json)
        });

        match result {
            Ok(json) if self.log_outbound => {
                self.sink.info(&format!("Sent message to server: {}", json));
            }
            Ok(_) => {}
            Err(e) => {
                self.sink.error(&format!(
                    "Failed to send {} message: {}",
                    message.action(),
                    e
                ));
            }
        }
    }
}

impl<T: Transport + 'static> EventHandler for WebSocketClient<T> {
    fn on_open(&self, conn: &dyn Connection) {
        if !self.transition(ClientState::Open) {
            return;
        }

        self.sink.info(&format!(
            "WebSocket connection established for client {}",
            self.client_id
        ));

        self.send_message(conn, &ClientMessage::announce(self.client_id));
        self.send_message(conn, &ClientMessage::subscribe(self.channel.as_str()));
    }

    fn on_message(&self, _conn: &dyn Connection, text: &str) {
        if self.state() == ClientState::Closed {
            return;
        }

        self.sink
            .info(&format!("Received message from server: {}", text));
    }

    fn on_close(&self, _conn: &dyn Connection, reason: Option<&CloseReason>) {
        if !self.transition(ClientState::Closed) {
            return;
        }

        match reason {
            Some(reason) => self
                .sink
                .info(&format!("WebSocket connection closed: {}", reason)),
            None => self.sink.info("WebSocket connection closed"),
        }
    }

    fn on_error(&self, _conn: &dyn Connection, error: &WsError) {
        if !self.transition(ClientState::Error) {
            return;
        }

        self.sink.error(&format!("WebSocket error: {}", error));
    }
}

impl<T: Transport + 'static> fmt::Debug for WebSocketClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("client_id", &self.client_id)
            .field("channel", &self.channel)
            .field("state", &self.state())
            .field("log_outbound", &self.log_outbound)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::sink::{LogLevel, MemorySink};

    /// Event replayed by [`ScriptedTransport`].
    #[derive(Debug, Clone)]
    enum Scripted {
        Open,
        Message(&'static str),
        Error(WsError),
        Close,
    }

    /// Transport replaying a fixed sequence of events.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        sent: Mutex<Vec<String>>,
        closed: Mutex<bool>,
        fail_sends: bool,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().expect("lock").clone()
        }
    }

    impl Connection for ScriptedTransport {
        fn send(&self, text: &str) -> Result<(), WsError> {
            if self.fail_sends {
                return Err(WsError::SendFailed("broken pipe".to_string()));
            }
            self.sent.lock().expect("lock").push(text.to_string());
            Ok(())
        }

        fn close(&self) {
            *self.closed.lock().expect("lock") = true;
        }
    }

    impl Transport for ScriptedTransport {
        fn run(&self, handler: &dyn EventHandler) {
            if *self.closed.lock().expect("lock") {
                handler.on_close(self, None);
                return;
            }

            loop {
                let next = self.script.lock().expect("lock").pop_front();
                match next {
                    Some(Scripted::Open) => handler.on_open(self),
                    Some(Scripted::Message(text)) => handler.on_message(self, text),
                    Some(Scripted::Error(e)) => handler.on_error(self, &e),
                    Some(Scripted::Close) => {
                        handler.on_close(self, None);
                        return;
                    }
                    None => return,
                }
            }
        }
    }

    /// Transport whose loop blocks until `close` is called.
    struct BlockingTransport {
        close_tx: Mutex<mpsc::Sender<()>>,
        close_rx: Mutex<mpsc::Receiver<()>>,
    }

    impl BlockingTransport {
        fn new() -> Self {
            let (close_tx, close_rx) = mpsc::channel();
            Self {
                close_tx: Mutex::new(close_tx),
                close_rx: Mutex::new(close_rx),
            }
        }
    }

    impl Connection for BlockingTransport {
        fn send(&self, _text: &str) -> Result<(), WsError> {
            Ok(())
        }

        fn close(&self) {
            let _ = self.close_tx.lock().expect("lock").send(());
        }
    }

    impl Transport for BlockingTransport {
        fn run(&self, handler: &dyn EventHandler) {
            handler.on_open(self);
            let _ = self.close_rx.lock().expect("lock").recv();
            handler.on_close(self, Some(&CloseReason::with_code(1000, "")));
        }
    }

    fn client_with(
        script: Vec<Scripted>,
    ) -> (WebSocketClient<ScriptedTransport>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let client = WebSocketClient::with_transport(
            ScriptedTransport::new(script),
            "your_channel",
            sink.clone(),
        );
        (client, sink)
    }

    fn parse(frame: &str) -> serde_json::Value {
        serde_json::from_str(frame).expect("valid json")
    }

    #[test]
    fn test_client_new_is_init() {
        let (client, sink) = client_with(Vec::new());
        assert_eq!(client.state(), ClientState::Init);
        assert_eq!(client.channel(), "your_channel");
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_client_with_url_accepts_anything() {
        let client = WebSocketClient::with_url("definitely not a url", Arc::new(MemorySink::new()));
        assert_eq!(client.state(), ClientState::Init);
        assert_eq!(client.transport().url(), "definitely not a url");
    }

    #[test]
    fn test_client_new_uses_config() {
        let config = ClientConfig::new("ws://localhost:9999")
            .with_channel("http_responses")
            .with_log_outbound(true);
        let client = WebSocketClient::new(&config, Arc::new(MemorySink::new()));
        assert_eq!(client.channel(), "http_responses");
        assert_eq!(client.transport().url(), "ws://localhost:9999");
    }

    #[test]
    fn test_identities_are_distinct() {
        let sink = Arc::new(MemorySink::new());

        let ids: HashSet<ClientId> = (0..10_000)
            .map(|_| {
                WebSocketClient::with_transport(ScriptedTransport::default(), "c", sink.clone())
                    .client_id()
            })
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_open_sends_identity_then_subscription() {
        let (client, sink) = client_with(vec![Scripted::Open]);
        client.run();

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 2);

        let first = parse(&sent[0]);
        assert_eq!(first["action"], "client_id");
        assert_eq!(first["clientId"], client.client_id().to_string());

        let second = parse(&sent[1]);
        assert_eq!(second["action"], "subscribe");
        assert_eq!(second["channel"], "your_channel");

        assert_eq!(client.state(), ClientState::Open);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].message,
            format!("WebSocket connection established for client {}", client.client_id())
        );
    }

    #[test]
    fn test_close_before_open_is_safe() {
        let (client, sink) = client_with(vec![Scripted::Open]);
        client.close();
        client.run();

        assert!(client.transport().sent().is_empty());
        assert_eq!(client.state(), ClientState::Closed);
        assert_eq!(sink.records_at(LogLevel::Info).len(), 1);
    }

    #[test]
    fn test_close_twice_is_safe() {
        let (client, _sink) = client_with(Vec::new());
        client.close();
        client.close();
        client.close_handle().close();
    }

    #[test]
    fn test_messages_are_logged_without_sends() {
        let mut script = vec![Scripted::Open];
        let texts = ["one", "two", "three", "four", "five"];
        script.extend(texts.iter().map(|t| Scripted::Message(*t)));
        let (client, sink) = client_with(script);

        client.run();

        let info = sink.records_at(LogLevel::Info);
        // The first record is the open line.
        assert_eq!(info.len(), texts.len() + 1);
        for (record, text) in info[1..].iter().zip(texts) {
            assert_eq!(record.message, format!("Received message from server: {}", text));
        }
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[test]
    fn test_error_then_close() {
        let (client, sink) = client_with(vec![
            Scripted::Open,
            Scripted::Error(WsError::Protocol("reset by peer".to_string())),
            Scripted::Close,
        ]);

        client.run();

        let records = sink.records();
        let tail: Vec<_> = records[1..].to_vec();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].level, LogLevel::Error);
        assert_eq!(tail[0].message, "WebSocket error: protocol error: reset by peer");
        assert_eq!(tail[1].level, LogLevel::Info);
        assert_eq!(tail[1].message, "WebSocket connection closed");
        assert_eq!(client.state(), ClientState::Closed);
    }

    #[test]
    fn test_error_without_close_keeps_error_state() {
        let (client, sink) = client_with(vec![
            Scripted::Open,
            Scripted::Error(WsError::Protocol("timeout".to_string())),
        ]);

        client.run();

        assert_eq!(client.state(), ClientState::Error);
        assert_eq!(sink.records_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_events_after_close_are_ignored() {
        let (client, sink) = client_with(vec![Scripted::Open, Scripted::Close]);
        client.run();

        let conn = client.transport();
        client.on_message(conn, "late");
        client.on_error(conn, &WsError::Closed);
        client.on_close(conn, None);
        client.on_open(conn);

        assert_eq!(sink.records().len(), 2);
        assert_eq!(client.transport().sent().len(), 2);
        assert_eq!(client.state(), ClientState::Closed);
    }

    #[test]
    fn test_hello_world_scenario() {
        let (client, sink) = client_with(vec![
            Scripted::Open,
            Scripted::Message("hello"),
            Scripted::Message("world"),
            Scripted::Close,
        ]);

        client.run();

        let messages: Vec<String> = sink.records().into_iter().map(|r| r.message).collect();
        assert_eq!(
            messages,
            vec![
                format!("WebSocket connection established for client {}", client.client_id()),
                "Received message from server: hello".to_string(),
                "Received message from server: world".to_string(),
                "WebSocket connection closed".to_string(),
            ]
        );
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[test]
    fn test_outbound_logging() {
        let sink = Arc::new(MemorySink::new());
        let client = WebSocketClient::with_transport(
            ScriptedTransport::new(vec![Scripted::Open]),
            "your_channel",
            sink.clone(),
        )
        .with_outbound_logging(true);

        client.run();

        let info = sink.records_at(LogLevel::Info);
        assert_eq!(info.len(), 3);
        assert!(info[1].message.starts_with("Sent message to server: {\"action\":\"client_id\""));
        assert_eq!(
            info[2].message,
            r#"Sent message to server: {"action":"subscribe","channel":"your_channel"}"#
        );
    }

    #[test]
    fn test_send_failure_is_logged_and_not_fatal() {
        let sink = Arc::new(MemorySink::new());
        let transport = ScriptedTransport {
            fail_sends: true,
            ..ScriptedTransport::new(vec![Scripted::Open, Scripted::Message("still here")])
        };
        let client = WebSocketClient::with_transport(transport, "your_channel", sink.clone());

        client.run();

        let errors = sink.records_at(LogLevel::Error);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].message,
            "Failed to send client_id message: send failed: broken pipe"
        );
        assert_eq!(client.state(), ClientState::Open);
        assert!(sink
            .records()
            .iter()
            .any(|r| r.message == "Received message from server: still here"));
    }

    #[test]
    fn test_close_from_other_thread_unblocks_run() {
        let sink = Arc::new(MemorySink::new());
        let client = Arc::new(WebSocketClient::with_transport(
            BlockingTransport::new(),
            "your_channel",
            sink.clone(),
        ));

        let runner = {
            let client = Arc::clone(&client);
            thread::spawn(move || client.run())
        };

        thread::sleep(Duration::from_millis(50));
        client.close_handle().close();
        runner.join().expect("run thread");

        assert_eq!(client.state(), ClientState::Closed);
        let last = sink.records().pop().expect("closure record");
        assert_eq!(last.message, "WebSocket connection closed: code: 1000");
    }

    #[test]
    fn test_close_handle_sent_to_another_thread() {
        let (client, sink) = client_with(vec![Scripted::Open, Scripted::Close]);
        let handle = client.close_handle();

        let closer = {
            let handle = handle.clone();
            thread::spawn(move || handle.close())
        };
        closer.join().expect("closer thread");
        client.run();

        assert!(client.transport().sent().is_empty());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "WebSocket connection closed");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ClientState::Init.to_string(), "init");
        assert_eq!(ClientState::Closed.to_string(), "closed");
    }
}
