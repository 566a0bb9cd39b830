//! Shared Module
//!
//! Types shared between the server and the participant client. Everything
//! here is serializable and travels over HTTP as JSON.

/// Chat message data structures
pub mod message;

/// Router envelopes (document updates, chat, language, presence)
pub mod event;

/// Shared error types
pub mod error;

/// Session records and patches
pub mod session;

/// Opaque document snapshots
pub mod snapshot;

/// Question bank records and selection criteria
pub mod question;

/// Client configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{Category, Envelope};
pub use message::{ChatMessage, ChatPage, Pagination};
pub use question::{NewQuestion, Question, SelectionCriterion};
pub use session::{Language, NewSession, Participants, Session, SessionPatch};
pub use snapshot::Snapshot;
