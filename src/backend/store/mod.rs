//! Persistence Module
//!
//! Storage traits for the three record kinds the server owns, with an
//! in-memory implementation (used when no database is configured, and in
//! tests) and a SQLite implementation.
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs      - Traits, StoreError and the Stores bundle
//! ├── memory.rs   - In-memory stores
//! └── sqlite.rs   - SQLite stores and pool setup
//! ```
//!
//! Handlers never see a concrete store. They receive `Arc<dyn ...>` through
//! [`Stores`], which `AppState` carries.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::{
    ChatMessage, NewQuestion, Question, SelectionCriterion, Session, SessionPatch,
};

/// In-memory stores
pub mod memory;

/// SQLite stores
pub mod sqlite;

pub use memory::{MemoryChatStore, MemoryQuestionStore, MemorySessionStore};
pub use sqlite::{connect_sqlite, SqliteChatStore, SqliteQuestionStore, SqliteSessionStore};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}' already exists")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back into a record
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }
}

/// Session directory storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new record; a duplicate id is `AlreadyExists`
    async fn create(&self, session: Session) -> Result<Session, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Overwrite the fields present in `patch` and return the new record
    async fn patch(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError>;

    /// Returns whether a record was removed
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Sessions the user participates in, oldest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }

    async fn has_participant(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(id)
            .await?
            .is_some_and(|session| session.participants.contains(user_id)))
    }
}

/// Which questions a random pick may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Only questions that are not soft-deleted
    Active,
    /// Every matching question
    IncludingDeleted,
}

/// Question bank storage
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError>;

    /// Mark as deleted; returns whether the question exists
    async fn soft_delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Uniformly random id among the matches in `tier`
    async fn random_match(
        &self,
        criterion: &SelectionCriterion,
        tier: Tier,
    ) -> Result<Option<i64>, StoreError>;
}

/// Append-only chat archive storage
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<(), StoreError>;

    /// Messages of a session ordered newest first, skipping `offset`
    async fn fetch_descending(
        &self,
        session_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    async fn count(&self, session_id: &str) -> Result<u64, StoreError>;
}

/// The set of stores a server instance runs on
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub questions: Arc<dyn QuestionStore>,
    pub chat: Arc<dyn ChatStore>,
}

impl Stores {
    /// Fresh in-memory stores
    pub fn memory() -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new()),
            questions: Arc::new(MemoryQuestionStore::new()),
            chat: Arc::new(MemoryChatStore::new()),
        }
    }

    /// Stores backed by a migrated SQLite pool
    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            sessions: Arc::new(SqliteSessionStore::new(pool.clone())),
            questions: Arc::new(SqliteQuestionStore::new(pool.clone())),
            chat: Arc::new(SqliteChatStore::new(pool)),
        }
    }
}
