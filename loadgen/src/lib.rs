//! pg-broadcast load generator.
//!
//! Inserts synthetic `http_response` rows into PostgreSQL at a randomized
//! pace while a [`pgbroadcast_client::WebSocketClient`] logs the resulting
//! notifications, so delivery latency can be read back from the logs.
//!
//! # Components
//!
//! - [`config`]: Load generator configuration
//! - [`row`]: Synthetic row generation
//! - [`writer`]: Row destinations
//! - [`service`]: The insert loop
//! - [`metrics`]: Insert counters
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod metrics;
pub mod row;
pub mod service;
pub mod writer;

pub use config::{ConfigError, LoadConfig};
pub use error::LoadgenError;
pub use metrics::LoadMetrics;
pub use row::HttpResponseRow;
pub use service::{LoadReport, LoadService};
pub use writer::{PgRowWriter, RowWriter};
