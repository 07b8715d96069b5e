//! Logging setup for the binaries.
//!
//! Installs a `tracing` subscriber writing to standard output and,
//! optionally, mirroring every line to a log file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file could not be opened.
    #[error("cannot open log file {path}: {source}")]
    File {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,

    /// File mirrored next to standard output.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Creates a configuration with the given fallback filter and no file.
    #[must_use]
    pub fn new(default_filter: impl Into<String>) -> Self {
        Self {
            default_filter: default_filter.into(),
            file: None,
        }
    }

    /// Mirrors the log to the given file.
    #[must_use]
    pub fn with_file(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.file = path.map(Into::into);
        self
    }
}

fn open_log_file(path: &Path) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    let file_layer = match &config.file {
        Some(path) => {
            let file = Arc::new(open_log_file(path)?);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_new() {
        let config = LogConfig::new("info");
        assert_eq!(config.default_filter, "info");
        assert!(config.file.is_none());
    }

    #[test]
    fn test_log_config_with_file() {
        let config = LogConfig::new("info").with_file(Some("client.log"));
        assert_eq!(config.file, Some(PathBuf::from("client.log")));

        let config = LogConfig::new("info").with_file(None::<PathBuf>);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_open_log_file_missing_directory() {
        let path = Path::new("/nonexistent-dir-for-pgbroadcast/client.log");
        let err = open_log_file(path).expect_err("must fail");
        assert!(err.to_string().contains("cannot open log file"));
    }
}
