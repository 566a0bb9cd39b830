//! Client configuration module
//!
//! Settings for a participant's synchronization engine, built with
//! [`ClientConfig::builder`].

use std::time::Duration;
use thiserror::Error;

use crate::shared::message::MAX_PAGE_SIZE;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CHAT_PAGE_SIZE: u32 = 10;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the session server
    pub server_url: String,
    /// Period of the background document checkpoint
    pub checkpoint_interval: Duration,
    /// Upper bound for the final checkpoint on leave
    pub exit_timeout: Duration,
    /// Messages per chat history page, at most 100
    pub chat_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            exit_timeout: DEFAULT_EXIT_TIMEOUT,
            chat_page_size: DEFAULT_CHAT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfigBuilder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.checkpoint_interval.is_zero() {
            return Err(ConfigError::InvalidValue("checkpoint_interval"));
        }
        if self.exit_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("exit_timeout"));
        }
        if self.chat_page_size == 0 || self.chat_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue("chat_page_size"));
        }
        Ok(())
    }

    /// Server URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    server_url: Option<String>,
    checkpoint_interval: Option<Duration>,
    exit_timeout: Option<Duration>,
    chat_page_size: Option<u32>,
}

impl ClientConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = Some(interval);
        self
    }

    pub fn exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = Some(timeout);
        self
    }

    pub fn chat_page_size(mut self, size: u32) -> Self {
        self.chat_page_size = Some(size);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            server_url: self.server_url.unwrap_or(defaults.server_url),
            checkpoint_interval: self
                .checkpoint_interval
                .unwrap_or(defaults.checkpoint_interval),
            exit_timeout: self.exit_timeout.unwrap_or(defaults.exit_timeout),
            chat_page_size: self.chat_page_size.unwrap_or(defaults.chat_page_size),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
    #[error("failed to read config file: {0}")]
    Io(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}
