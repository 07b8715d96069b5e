//! Server error types.

/// Broadcast server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database or `LISTEN` failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
