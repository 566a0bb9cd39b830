//! Common test utilities and helpers
//!
//! - In-memory and SQLite backed app state
//! - Session and question fixtures
//! - Polling helpers for watch channels

#[cfg(feature = "ssr")]
#[allow(dead_code)]
pub mod fixtures;

#[cfg(feature = "ssr")]
pub use fixtures::*;
