//! WebSocket endpoint.
//!
//! Every connected client receives every notification payload as a text
//! frame. Inbound frames are only logged; the `client_id` announcement is
//! also recorded in the [`ConnectionRegistry`].

pub mod connection;
pub mod handler;
pub mod messages;
pub mod metrics;

pub use connection::ConnectionRegistry;
pub use handler::ws_handler;
pub use messages::InboundMessage;
pub use metrics::{MetricsSnapshot, ServerMetrics};
