//! Broadcast server counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters for connections, frames and forwarded notifications.
#[derive(Debug)]
pub struct ServerMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    invalid_messages: AtomicU64,
    notifications: AtomicU64,
    start_time: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            invalid_messages: AtomicU64::new(0),
            notifications: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a client connecting.
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a client disconnecting.
    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a frame received from a client.
    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a frame pushed to a client.
    pub fn record_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a client frame that was not valid JSON.
    pub fn record_invalid_message(&self) {
        self.invalid_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a PostgreSQL notification.
    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total connections opened.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    /// Returns the total connections closed.
    #[must_use]
    pub fn connections_closed(&self) -> u64 {
        self.connections_closed.load(Ordering::Relaxed)
    }

    /// Returns the current active connections.
    #[must_use]
    pub fn active_connections(&self) -> u64 {
        self.connections_opened()
            .saturating_sub(self.connections_closed())
    }

    /// Returns the total frames received.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Returns the total frames sent.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns the total invalid client frames.
    #[must_use]
    pub fn invalid_messages(&self) -> u64 {
        self.invalid_messages.load(Ordering::Relaxed)
    }

    /// Returns the total notifications received.
    #[must_use]
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_connections: self.active_connections(),
            connections_opened: self.connections_opened(),
            messages_received: self.messages_received(),
            messages_sent: self.messages_sent(),
            invalid_messages: self.invalid_messages(),
            notifications: self.notifications(),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

/// A point-in-time copy of [`ServerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Active connections.
    pub active_connections: u64,
    /// Total connections opened.
    pub connections_opened: u64,
    /// Frames received.
    pub messages_received: u64,
    /// Frames sent.
    pub messages_sent: u64,
    /// Invalid client frames.
    pub invalid_messages: u64,
    /// Notifications received.
    pub notifications: u64,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ServerMetrics::new();
        assert_eq!(metrics.connections_opened(), 0);
        assert_eq!(metrics.active_connections(), 0);
        assert_eq!(metrics.notifications(), 0);
    }

    #[test]
    fn test_metrics_record_connection() {
        let metrics = ServerMetrics::new();

        metrics.record_connection_opened();
        metrics.record_connection_opened();
        metrics.record_connection_closed();

        assert_eq!(metrics.connections_opened(), 2);
        assert_eq!(metrics.connections_closed(), 1);
        assert_eq!(metrics.active_connections(), 1);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = ServerMetrics::new();

        metrics.record_connection_opened();
        metrics.record_message_received();
        metrics.record_invalid_message();
        metrics.record_message_sent();
        metrics.record_notification();

        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.active_connections, 1);
        assert_eq!(snapshot.messages_received, 1);
        assert_eq!(snapshot.invalid_messages, 1);
        assert_eq!(snapshot.messages_sent, 1);
        assert_eq!(snapshot.notifications, 1);
    }
}
