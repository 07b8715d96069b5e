//! Load generator metrics.
//!
//! Provides atomic counters for monitoring insert progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics for the load generator.
#[derive(Debug)]
pub struct LoadMetrics {
    /// Rows inserted successfully.
    rows_inserted: AtomicU64,

    /// Failed inserts.
    inserts_failed: AtomicU64,

    /// Start time for rate calculation.
    start_time: Instant,
}

impl Default for LoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows_inserted: AtomicU64::new(0),
            inserts_failed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a successful insert.
    pub fn record_insert(&self) {
        self.rows_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed insert.
    pub fn record_failure(&self) {
        self.inserts_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns rows inserted.
    #[must_use]
    pub fn rows_inserted(&self) -> u64 {
        self.rows_inserted.load(Ordering::Relaxed)
    }

    /// Returns failed inserts.
    #[must_use]
    pub fn inserts_failed(&self) -> u64 {
        self.inserts_failed.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns inserted rows per second.
    #[must_use]
    pub fn rows_per_second(&self) -> f64 {
        let elapsed = self.uptime().as_secs_f64();
        if elapsed > 0.0 {
            self.rows_inserted() as f64 / elapsed
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoadMetrics::new();
        assert_eq!(metrics.rows_inserted(), 0);
        assert_eq!(metrics.inserts_failed(), 0);
    }

    #[test]
    fn test_metrics_record() {
        let metrics = LoadMetrics::default();

        metrics.record_insert();
        metrics.record_insert();
        metrics.record_failure();

        assert_eq!(metrics.rows_inserted(), 2);
        assert_eq!(metrics.inserts_failed(), 1);
    }

    #[test]
    fn test_metrics_rate_non_negative() {
        let metrics = LoadMetrics::new();
        metrics.record_insert();
        assert!(metrics.rows_per_second() >= 0.0);
    }
}
