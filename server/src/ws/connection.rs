//! Connected client tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

/// Global connection ID counter.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique connection ID.
#[must_use]
pub fn next_connection_id() -> u64 {
    CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Registry of open connections and the identities they announced.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection ID to announced client ID, if any.
    connections: RwLock<HashMap<u64, Option<String>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection.
    pub async fn on_connect(&self, connection_id: u64) {
        self.connections.write().await.insert(connection_id, None);
    }

    /// Removes a connection, returning the client ID it announced.
    pub async fn on_disconnect(&self, connection_id: u64) -> Option<String> {
        self.connections
            .write()
            .await
            .remove(&connection_id)
            .flatten()
    }

    /// Records the client ID announced on a connection.
    ///
    /// A later announcement replaces the earlier one. Returns false if the
    /// connection is not registered.
    pub async fn set_client_id(&self, connection_id: u64, client_id: impl Into<String>) -> bool {
        match self.connections.write().await.get_mut(&connection_id) {
            Some(slot) => {
                *slot = Some(client_id.into());
                true
            }
            None => false,
        }
    }

    /// Returns the number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns the announced client IDs, sorted.
    pub async fn client_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .connections
            .read()
            .await
            .values()
            .flatten()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}
