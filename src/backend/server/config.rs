/**
 * Server Configuration
 *
 * Settings are layered, lowest priority first:
 * 1. built-in defaults;
 * 2. an optional TOML file named by `PAIRSYNC_CONFIG`;
 * 3. environment variables: `SERVER_PORT`, `DATABASE_URL`,
 *    `PAIRSYNC_CHANNEL_CAPACITY`, `RUST_LOG`.
 *
 * Without a database URL the server runs on in-memory stores.
 *
 * ```toml
 * bind_addr = "0.0.0.0:3000"
 * database_url = "sqlite://pairsync.db"
 * channel_capacity = 1000
 * cleanup_interval_secs = 300
 * log_filter = "info,pairsync=debug"
 * ```
 */
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::backend::realtime::router::DEFAULT_CHANNEL_CAPACITY;
use crate::shared::ConfigError;

pub const CONFIG_PATH_VAR: &str = "PAIRSYNC_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// SQLite URL; `None` selects the in-memory stores
    pub database_url: Option<String>,
    /// Buffer size of every router channel
    pub channel_capacity: usize,
    /// Period of the idle router cleanup
    pub cleanup_interval_secs: u64,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            cleanup_interval_secs: 300,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from the default sources
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn from_sources<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SERVER_PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT"))?;
            self.bind_addr.set_port(port);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            let url = url.trim();
            self.database_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(capacity) = lookup("PAIRSYNC_CHANNEL_CAPACITY") {
            self.channel_capacity = capacity
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAIRSYNC_CHANNEL_CAPACITY"))?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            if !filter.trim().is_empty() {
                self.log_filter = filter;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue("channel_capacity"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("cleanup_interval_secs"));
        }
        if let Some(url) = &self.database_url {
            if !url.starts_with("sqlite:") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }
}
