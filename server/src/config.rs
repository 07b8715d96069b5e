//! Server configuration.

use std::env;

use crate::error::ServerError;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default database URL.
pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/postgres";

/// Default PostgreSQL notification channel.
pub const DEFAULT_NOTIFY_CHANNEL: &str = "http_response_inserted";

/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "server.log";

/// Configuration for the broadcast server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// PostgreSQL URL. Without one the server accepts clients but never
    /// receives notifications.
    pub database_url: Option<String>,

    /// Channel passed to `LISTEN`.
    pub notify_channel: String,

    /// File the log is mirrored to.
    pub log_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ServerConfig {
    /// Creates a configuration bound to `host:port` with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database_url: Some(DEFAULT_DATABASE_URL.to_string()),
            notify_channel: DEFAULT_NOTIFY_CHANNEL.to_string(),
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
        }
    }

    /// Loads the configuration from environment variables.
    ///
    /// An empty `DATABASE_URL` disables the notification listener.
    ///
    /// # Errors
    ///
    /// Returns an error if `API_PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, ServerError> {
        let mut config = Self::default();

        if let Ok(host) = env::var("API_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("API_PORT") {
            config.port = port.trim().parse().map_err(|_| {
                ServerError::InvalidConfig("API_PORT must be a valid port number".to_string())
            })?;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = (!url.is_empty()).then_some(url);
        }
        if let Ok(channel) = env::var("PGB_NOTIFY_CHANNEL") {
            config.notify_channel = channel;
        }
        if let Ok(path) = env::var("SERVER_LOG_FILE") {
            config.log_file = (!path.is_empty()).then_some(path);
        }

        Ok(config)
    }

    /// Sets the database URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Runs without a notification listener.
    #[must_use]
    pub fn without_database(mut self) -> Self {
        self.database_url = None;
        self
    }

    /// Sets the notification channel.
    #[must_use]
    pub fn with_notify_channel(mut self, channel: impl Into<String>) -> Self {
        self.notify_channel = channel.into();
        self
    }

    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.is_empty() {
            return Err(ServerError::InvalidConfig(
                "host cannot be empty".to_string(),
            ));
        }

        if self.notify_channel.is_empty() {
            return Err(ServerError::InvalidConfig(
                "notify_channel cannot be empty".to_string(),
            ));
        }

        if matches!(&self.database_url, Some(url) if !url.starts_with("postgres")) {
            return Err(ServerError::InvalidConfig(
                "database_url must be a postgres:// URL".to_string(),
            ));
        }

        Ok(())
    }
}
