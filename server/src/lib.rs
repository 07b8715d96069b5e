//! pg-broadcast server - forwards PostgreSQL notifications over WebSocket.
//!
//! The server `LISTEN`s on a PostgreSQL channel and pushes every
//! notification payload to all connected WebSocket clients.
//!
//! # Components
//!
//! - [`config`]: Server configuration
//! - [`notify`]: PostgreSQL notification listener
//! - [`ws`]: WebSocket endpoint and connection tracking
//! - [`state`]: Shared application state
//! - [`server`]: Router and serve loop
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod notify;
pub mod server;
pub mod state;
pub mod ws;

pub use config::ServerConfig;
pub use error::ServerError;
pub use notify::{forward_payload, HttpResponseNotice, NotificationListener};
pub use server::{router, serve, Server};
pub use state::AppState;
