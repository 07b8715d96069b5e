//! Shared application state.

use std::sync::Arc;

use pgbroadcast_client::StopSignal;
use tokio::sync::broadcast;

use crate::ws::{ConnectionRegistry, ServerMetrics};

/// Capacity of the notification fan-out channel.
pub const BROADCAST_CAPACITY: usize = 1024;

/// State shared by the listener and every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fan-out of raw notification payloads.
    pub notifications: broadcast::Sender<String>,
    /// Open connections.
    pub connections: Arc<ConnectionRegistry>,
    /// Counters.
    pub metrics: Arc<ServerMetrics>,
    /// Shutdown signal.
    pub stop: StopSignal,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StopSignal::new())
    }
}

impl AppState {
    /// Creates state bound to the given stop signal.
    #[must_use]
    pub fn new(stop: StopSignal) -> Self {
        let (notifications, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self {
            notifications,
            connections: Arc::new(ConnectionRegistry::new()),
            metrics: Arc::new(ServerMetrics::new()),
            stop,
        }
    }

    /// Sends a payload to every connected client.
    ///
    /// Returns the number of connections it was queued for.
    pub fn broadcast(&self, payload: impl Into<String>) -> usize {
        self.notifications.send(payload.into()).unwrap_or(0)
    }

    /// Returns a receiver for payloads broadcast from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.notifications.subscribe()
    }
}
