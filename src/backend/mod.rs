//! Backend Module
//!
//! Server-side code: an Axum HTTP server exposing the session directory,
//! the question picker, the chat log archive and the presence/broadcast
//! router. Only compiled with the `ssr` feature.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Configuration, state, initialization
//! ├── routes/         - Route assembly
//! ├── store/          - Storage traits, in-memory and SQLite stores
//! ├── sessions/       - Session directory handlers
//! ├── questions/      - Question picker and handlers
//! ├── chat/           - Chat archive and handlers
//! ├── realtime/       - Session router, relay, SSE subscriptions
//! └── error/          - BackendError and HTTP conversion
//! ```
//!
//! # State Management
//!
//! `AppState` holds the stores as `Arc<dyn ...>` trait objects plus the
//! relay, archive and picker built on them. Handlers extract the piece they
//! need through `FromRef`.

/// Server initialization and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Persistence
pub mod store;

/// Session directory
pub mod sessions;

/// Question picker
pub mod questions;

/// Chat archive
pub mod chat;

/// Presence/broadcast router
pub mod realtime;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
