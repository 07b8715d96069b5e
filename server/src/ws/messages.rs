//! Inbound client frames.
//!
//! Clients send JSON objects tagged with an `action` field. Only the
//! `client_id` announcement is acted on; every other valid JSON frame is
//! logged as-is, and anything else is reported with a hex dump.

use std::fmt::Write as _;

use serde_json::Value;

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{"action":"client_id","clientId":"..."}`.
    ClientId(String),

    /// Any other JSON value.
    Other(Value),

    /// Payload that is not JSON.
    Invalid {
        /// Parse error.
        error: String,
        /// Lowercase hex of the raw payload.
        hex: String,
    },
}

impl InboundMessage {
    /// Classifies a raw payload.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                return Self::Invalid {
                    error: e.to_string(),
                    hex: hex_dump(payload),
                }
            }
        };

        let is_announcement = value.get("action").and_then(Value::as_str) == Some("client_id");
        match value.get("clientId").and_then(Value::as_str) {
            Some(client_id) if is_announcement => Self::ClientId(client_id.to_string()),
            _ => Self::Other(value),
        }
    }
}

/// Returns the lowercase hex encoding of `bytes`.
#[must_use]
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
}
