//! PairSync - Main Library
//!
//! PairSync is the session synchronization layer of a peer-to-peer
//! coding-interview platform. Two participants share one code document, one
//! chat stream and one language selection; this crate keeps those consistent
//! in real time and persists recoverable snapshots of the shared document.
//!
//! # Overview
//!
//! This library provides:
//! - A Yjs-compatible CRDT document store with snapshot decode/encode
//! - A two-party presence/broadcast router for document updates, chat and
//!   language-change notices
//! - A session directory, a two-tier random question picker and a paginated
//!   chat log archive, served over HTTP with Axum
//! - A participant-side engine that checkpoints the document periodically and
//!   on exit, and suppresses language-change echoes
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared between server and client
//!   - Sessions, snapshots, chat messages, questions, router envelopes
//!   - Shared error types and client configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server, routes, error responses
//!   - Session/question/chat stores (in-memory and SQLite)
//!   - Presence/broadcast router and SSE subscriptions
//!
//! - **`client`** - Participant-side synchronization engine
//!   - Document state, language sync, checkpointing, chat history
//!   - HTTP and in-process transports
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules, the server binary and
//!   the in-process client transport.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pairsync::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(&config).await;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - **Server**: stores are `Arc<dyn Trait>`, fan-out uses `broadcast::Sender`
//! - **Client**: one cooperative task per participant owns the document state;
//!   only the transport's inbound reader runs as a separate task

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Participant-side synchronization engine
pub mod client;
