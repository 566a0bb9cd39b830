//! Session Directory Module
//!
//! HTTP surface of the session directory. Records live in a
//! [`SessionStore`](crate::backend::store::SessionStore); a record is created
//! once per match and afterwards only receives single-field overwrites.

/// HTTP handlers
pub mod handlers;
