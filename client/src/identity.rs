//! Client identity.
//!
//! Every client instance announces a random UUID v4 to the server once per
//! connection. The identity is only ever used as a payload value.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of one client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generates a new random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ClientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical hyphenated lowercase form.
        write!(f, "{}", self.0.hyphenated())
    }
}
