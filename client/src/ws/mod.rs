//! WebSocket client for pg-broadcast notifications.
//!
//! This module provides the single-connection client, its transport
//! adapter and the protocol frames sent on open.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pgbroadcast_client::ws::{ClientConfig, WebSocketClient};
//! use pgbroadcast_client::TracingSink;
//!
//! let config = ClientConfig::new("ws://localhost:8080").with_channel("your_channel");
//! let client = WebSocketClient::new(&config, Arc::new(TracingSink::new()));
//!
//! // Blocks until the connection closes.
//! client.run();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod transport;

pub use client::{ClientState, CloseHandle, WebSocketClient};
pub use config::{ClientConfig, TransportOptions};
pub use error::WsError;
pub use messages::ClientMessage;
pub use transport::{CloseReason, Connection, EventHandler, Transport, TungsteniteTransport};
