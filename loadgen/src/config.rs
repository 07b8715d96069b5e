//! Load generator configuration.
//!
//! Provides configuration options for the insert harness.

use std::env;
use std::time::Duration;

use pgbroadcast_client::ws::config::{DEFAULT_CHANNEL, DEFAULT_WS_URL};

/// Default database URL.
pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/postgres";

/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "loadgen.log";

/// Configuration for the load generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// WebSocket server the client connects to.
    pub server_url: String,

    /// Channel the client subscribes to.
    pub channel: String,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Number of rows to insert.
    pub rows: u32,

    /// Minimum pause after each insert in milliseconds.
    pub min_delay_ms: u64,

    /// Maximum pause after each insert in milliseconds.
    pub max_delay_ms: u64,

    /// File the log is mirrored to.
    pub log_file: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_WS_URL.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            rows: 1000,
            min_delay_ms: 500,
            max_delay_ms: 2000,
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
        }
    }
}

impl LoadConfig {
    /// Loads the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("PGB_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(channel) = env::var("PGB_CHANNEL") {
            config.channel = channel;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(rows) = env::var("LOADGEN_ROWS") {
            config.rows = parse_number("LOADGEN_ROWS", &rows)?;
        }
        if let Ok(ms) = env::var("LOADGEN_MIN_DELAY_MS") {
            config.min_delay_ms = parse_number("LOADGEN_MIN_DELAY_MS", &ms)?;
        }
        if let Ok(ms) = env::var("LOADGEN_MAX_DELAY_MS") {
            config.max_delay_ms = parse_number("LOADGEN_MAX_DELAY_MS", &ms)?;
        }
        if let Ok(path) = env::var("LOADGEN_LOG_FILE") {
            config.log_file = (!path.is_empty()).then_some(path);
        }

        Ok(config)
    }

    /// Sets the number of rows.
    #[must_use]
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the pause range after each insert.
    #[must_use]
    pub fn with_delay_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_delay_ms = min_ms;
        self.max_delay_ms = max_ms;
        self
    }

    /// Sets the database URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Returns the minimum pause.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Returns the maximum pause.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::InvalidRowCount);
        }

        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidDelayRange);
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(name.to_string()))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Row count is zero.
    #[error("rows must be > 0")]
    InvalidRowCount,

    /// Delay range is inverted.
    #[error("min_delay_ms must be <= max_delay_ms")]
    InvalidDelayRange,

    /// Database URL is empty.
    #[error("database_url cannot be empty")]
    MissingDatabaseUrl,

    /// A numeric variable could not be parsed.
    #[error("{0} must be a valid number")]
    InvalidNumber(String),
}
