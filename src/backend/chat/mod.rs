//! Chat Backend Module
//!
//! The chat archive and its HTTP surface. Messages are appended once and
//! never edited; history is read back in pages.
//!
//! # Module Structure
//!
//! ```text
//! chat/
//! ├── mod.rs       - Module exports
//! ├── archive.rs   - ChatArchive (append, page)
//! └── handlers.rs  - HTTP handlers
//! ```

/// Append-only chat archive with reverse pagination
pub mod archive;

/// HTTP handlers
pub mod handlers;

pub use archive::ChatArchive;
