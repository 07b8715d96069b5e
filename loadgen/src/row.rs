//! Synthetic `http_response` rows.
//!
//! Each row imitates one HTTP response observed by a monitoring node.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rand::Rng;

/// One row of the `http_response` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseRow {
    /// Observation time.
    pub ts: NaiveDateTime,
    /// Reporting node, `Node-1` to `Node-10`.
    pub node_tag: String,
    /// Source address in `192.168.0.0/16`.
    pub src_ip: String,
    /// Source port, 1000 to 9999.
    pub src_port: String,
    /// HTTP status code, 200 to 500.
    pub code: String,
}

impl HttpResponseRow {
    /// Generates a random row stamped with the current local time.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            ts: Local::now().naive_local(),
            node_tag: format!("Node-{}", rng.random_range(1..=10u8)),
            src_ip: format!(
                "192.168.{}.{}",
                rng.random_range(0..=255u8),
                rng.random_range(0..=255u8)
            ),
            src_port: rng.random_range(1000..=9999u16).to_string(),
            code: rng.random_range(200..=500u16).to_string(),
        }
    }
}

/// Picks a pause uniformly from `[min, max]`.
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }

    let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rng.random_range(min_ms..=max_ms))
}
