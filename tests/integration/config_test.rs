//! Server configuration loaded from the process environment
//!
//! These tests mutate environment variables, so they run serially.

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::Write;

use pairsync::backend::server::config::CONFIG_PATH_VAR;
use pairsync::backend::ServerConfig;
use pairsync::shared::ConfigError;

const VARS: [&str; 5] = [
    CONFIG_PATH_VAR,
    "SERVER_PORT",
    "DATABASE_URL",
    "PAIRSYNC_CHANNEL_CAPACITY",
    "RUST_LOG",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::load().unwrap();
    assert_eq!(config, ServerConfig::default());
    assert!(config.database_url.is_none());
}

#[test]
#[serial]
fn test_file_then_environment() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "bind_addr = \"127.0.0.1:4000\"\nchannel_capacity = 32\ndatabase_url = \"sqlite::memory:\""
    )
    .unwrap();

    std::env::set_var(CONFIG_PATH_VAR, file.path());
    std::env::set_var("SERVER_PORT", "5000");
    let config = ServerConfig::load().unwrap();
    clear_env();

    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:5000");
    assert_eq!(config.channel_capacity, 32);
    assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
}

#[test]
#[serial]
fn test_invalid_sources_are_reported() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "no_such_setting = true").unwrap();
    std::env::set_var(CONFIG_PATH_VAR, file.path());
    assert!(matches!(ServerConfig::load(), Err(ConfigError::Parse(_))));

    std::env::remove_var(CONFIG_PATH_VAR);
    std::env::set_var("DATABASE_URL", "postgres://localhost/pairsync");
    assert!(matches!(ServerConfig::load(), Err(ConfigError::InvalidUrl(_))));

    std::env::remove_var("DATABASE_URL");
    std::env::set_var("PAIRSYNC_CHANNEL_CAPACITY", "lots");
    assert_eq!(
        ServerConfig::load(),
        Err(ConfigError::InvalidValue("PAIRSYNC_CHANNEL_CAPACITY"))
    );
    clear_env();
}

#[test]
#[serial]
fn test_missing_config_file() {
    clear_env();
    std::env::set_var(CONFIG_PATH_VAR, "/nonexistent/pairsync.toml");
    assert!(matches!(ServerConfig::load(), Err(ConfigError::Io(_))));
    clear_env();
}
