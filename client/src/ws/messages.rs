//! WebSocket message types.
//!
//! Defines the frames the client sends after the connection opens.

use serde::{Deserialize, Serialize};

use crate::identity::ClientId;

/// Client-to-server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identity announcement, sent first after open.
    ClientId {
        /// Identity of the sending client.
        #[serde(rename = "clientId")]
        client_id: ClientId,
    },
    /// Channel subscription, sent right after the identity announcement.
    Subscribe {
        /// Channel to subscribe to.
        channel: String,
    },
}

impl ClientMessage {
    /// Creates an identity announcement.
    #[must_use]
    pub fn announce(client_id: ClientId) -> Self {
        Self::ClientId { client_id }
    }

    /// Creates a subscription request.
    #[must_use]
    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self::Subscribe {
            channel: channel.into(),
        }
    }

    /// Returns the action name carried on the wire.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::ClientId { .. } => "client_id",
            Self::Subscribe { .. } => "subscribe",
        }
    }

    /// Serializes the message into a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, super::error::WsError> {
        Ok(serde_json::to_string(self)?)
    }
}
