//! Question Module
//!
//! Random question selection with a soft-delete fallback, and the glue
//! endpoints for adding, fetching and soft-deleting questions.

/// Two-tier random picker
pub mod picker;

/// HTTP handlers
pub mod handlers;

pub use picker::{PickError, QuestionPicker};
