//! WebSocket client configuration.
//!
//! Provides configuration options for the client and its transport.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::error::WsError;

/// Default WebSocket URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

/// Default subscription channel.
pub const DEFAULT_CHANNEL: &str = "your_channel";

/// Default log file, mirrored next to standard output.
pub const DEFAULT_LOG_FILE: &str = "client.log";

/// Default close handshake timeout in seconds.
pub const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 5;

/// Options consumed by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// WebSocket URL.
    pub url: String,

    /// How long to wait for the peer's close frame after a local close.
    pub close_timeout: Duration,

    /// Heartbeat ping interval (None = no heartbeat).
    pub ping_interval: Option<Duration>,
}

impl TransportOptions {
    /// Creates transport options for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            close_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
            ping_interval: None,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL.
    pub url: String,

    /// Channel named in the subscription request.
    pub channel: String,

    /// File the log is mirrored to (None = standard output only).
    pub log_file: Option<PathBuf>,

    /// Whether outbound frames are logged.
    pub log_outbound: bool,

    /// Close handshake timeout.
    pub close_timeout: Duration,

    /// Heartbeat ping interval.
    pub ping_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            log_outbound: false,
            close_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
            ping_interval: None,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Loads the configuration from `PGB_*` environment variables.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, WsError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("PGB_SERVER_URL") {
            config.url = url;
        }
        if let Ok(channel) = env::var("PGB_CHANNEL") {
            config.channel = channel;
        }
        if let Ok(path) = env::var("PGB_LOG_FILE") {
            config.log_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Ok(flag) = env::var("PGB_LOG_OUTBOUND") {
            config.log_outbound = parse_env("PGB_LOG_OUTBOUND", &flag)?;
        }
        if let Ok(secs) = env::var("PGB_CLOSE_TIMEOUT_SECS") {
            let secs: u64 = parse_env("PGB_CLOSE_TIMEOUT_SECS", &secs)?;
            config.close_timeout = Duration::from_secs(secs);
        }
        if let Ok(secs) = env::var("PGB_PING_INTERVAL_SECS") {
            let secs: u64 = parse_env("PGB_PING_INTERVAL_SECS", &secs)?;
            config.ping_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the subscription channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Sets the log file.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Disables the log file.
    #[must_use]
    pub fn without_log_file(mut self) -> Self {
        self.log_file = None;
        self
    }

    /// Enables or disables logging of outbound frames.
    #[must_use]
    pub fn with_log_outbound(mut self, enabled: bool) -> Self {
        self.log_outbound = enabled;
        self
    }

    /// Sets the close handshake timeout.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets the heartbeat ping interval.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    /// Returns the options for the transport adapter.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            url: self.url.clone(),
            close_timeout: self.close_timeout,
            ping_interval: self.ping_interval,
        }
    }

    /// Validates the configuration.
    ///
    /// The client itself accepts any URL and reports failures as error
    /// events; binaries call this to fail fast on obvious mistakes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), WsError> {
        if self.url.is_empty() {
            return Err(WsError::InvalidConfig("url cannot be empty".to_string()));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(WsError::InvalidConfig(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.channel.trim().is_empty() {
            return Err(WsError::InvalidConfig(
                "channel cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, WsError> {
    value
        .trim()
        .parse()
        .map_err(|_| WsError::InvalidConfig(format!("{name} has an invalid value: {value}")))
}
