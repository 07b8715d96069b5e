//! Load generator error types.

use crate::config::ConfigError;

/// Load generator errors.
#[derive(Debug, thiserror::Error)]
pub enum LoadgenError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoadgenError::from(ConfigError::InvalidRowCount);
        assert_eq!(err.to_string(), "configuration error: rows must be > 0");
    }

    #[test]
    fn test_database_error_display() {
        let err = LoadgenError::from(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("database error:"));
    }
}
