//! Log sinks.
//!
//! The client reports lifecycle events through a [`LogSink`] handed to it at
//! construction instead of a process-wide logger.

use std::fmt;
use std::sync::Mutex;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Lifecycle and message records.
    Info,
    /// Transport and send failures.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Destination for leveled text records.
pub trait LogSink: Send + Sync {
    /// Records an informational line.
    fn info(&self, message: &str);

    /// Records an error line.
    fn error(&self, message: &str);
}

/// Sink forwarding records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new tracing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// One record captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Record level.
    pub level: LogLevel,
    /// Record text.
    pub message: String,
}

/// Sink keeping every record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the records at the given level.
    #[must_use]
    pub fn records_at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        let record = LogRecord {
            level,
            message: message.to_string(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
