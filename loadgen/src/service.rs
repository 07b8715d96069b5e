//! Insert loop.
//!
//! Inserts synthetic rows at a randomized pace until the configured count is
//! reached or the shared stop signal fires.

use std::sync::Arc;

use pgbroadcast_client::StopSignal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::config::{ConfigError, LoadConfig};
use super::metrics::LoadMetrics;
use super::row::{random_delay, HttpResponseRow};
use super::writer::RowWriter;

/// Outcome of one load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows inserted successfully.
    pub rows_inserted: u64,
    /// Failed inserts.
    pub failures: u64,
    /// True if the stop signal ended the run before all rows were attempted.
    pub stopped_early: bool,
}

/// The load generator service.
pub struct LoadService {
    /// Configuration.
    config: LoadConfig,

    /// Metrics.
    metrics: Arc<LoadMetrics>,

    /// Source of row values and pauses.
    rng: StdRng,
}

impl LoadService {
    /// Creates a new load service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: LoadConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a load service with a deterministic seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_seed(config: LoadConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: LoadConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            metrics: Arc::new(LoadMetrics::new()),
            rng,
        })
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<LoadMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Runs the insert loop.
    ///
    /// The stop signal is checked between iterations; an in-flight insert is
    /// always allowed to finish.
    pub async fn run<W: RowWriter>(&mut self, writer: &mut W, stop: &StopSignal) -> LoadReport {
        info!("Load generator started: {} rows", self.config.rows);

        let inserted_before = self.metrics.rows_inserted();
        let failed_before = self.metrics.inserts_failed();
        let mut stopped_early = false;

        for k in 0..self.config.rows {
            if stop.is_triggered() {
                stopped_early = true;
                break;
            }

            let row = HttpResponseRow::random(&mut self.rng);

            match writer.insert(&row).await {
                Ok(()) => {
                    self.metrics.record_insert();
                    debug!(
                        "Inserted row {}: {} {}:{} {}",
                        k, row.node_tag, row.src_ip, row.src_port, row.code
                    );
                }
                Err(e) => {
                    self.metrics.record_failure();
                    warn!("Insert {} failed: {}", k, e);
                }
            }

            let pause = random_delay(
                &mut self.rng,
                self.config.min_delay(),
                self.config.max_delay(),
            );
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = stop.triggered() => {}
            }

            if stop.is_triggered() {
                stopped_early = k + 1 < self.config.rows;
                break;
            }
        }

        let report = LoadReport {
            rows_inserted: self.metrics.rows_inserted() - inserted_before,
            failures: self.metrics.inserts_failed() - failed_before,
            stopped_early,
        };

        info!(
            "Load generator stopped: {} inserted, {} failed{}",
            report.rows_inserted,
            report.failures,
            if report.stopped_early { " (stopped early)" } else { "" }
        );

        report
    }
}
