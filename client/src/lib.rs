//! pg-broadcast client - real-time WebSocket client library.
//!
//! This crate connects to a pg-broadcast server, announces a generated
//! client identity, subscribes to one channel and logs every message the
//! server pushes until the connection closes.
//!
//! # Components
//!
//! - [`ws`]: client, transport adapter, configuration and protocol frames
//! - [`identity`]: the per-client UUID
//! - [`sink`]: log sinks handed to the client
//! - [`shutdown`]: cooperative stop signal shared with other work loops
//! - [`logging`]: subscriber setup for the binaries

pub mod identity;
pub mod logging;
pub mod shutdown;
pub mod sink;
pub mod ws;

pub use identity::ClientId;
pub use shutdown::StopSignal;
pub use sink::{LogLevel, LogRecord, LogSink, MemorySink, TracingSink};
pub use ws::{ClientConfig, ClientState, WebSocketClient, WsError};
