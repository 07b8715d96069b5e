//! WebSocket error types.
//!
//! Provides error types for the transport adapter and client.

/// WebSocket errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WsError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// WebSocket protocol or I/O error on an established connection.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Failed to serialize an outbound message.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An outbound frame could not be written.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The event loop is not running.
    #[error("not connected")]
    NotConnected,

    /// The connection has been closed.
    #[error("connection closed")]
    Closed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The event loop runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
