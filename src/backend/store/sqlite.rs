/**
 * SQLite Stores
 *
 * Database-backed implementations of the store traits. Queries use
 * `sqlx::query` / `query_as` with `FromRow` row structs that are mapped into
 * the shared records.
 *
 * Category membership is tested with `json_each` over the JSON array column,
 * and random picks use `ORDER BY RANDOM() LIMIT 1`.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use super::{ChatStore, QuestionStore, SessionStore, StoreError, Tier};
use crate::shared::{
    ChatMessage, Language, NewQuestion, Participants, Question, SelectionCriterion, Session,
    SessionPatch, Snapshot,
};

/// Open a pool for `database_url` and run the embedded migrations
///
/// In-memory databases get a single long-lived connection, since every new
/// connection would see an empty database.
pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_a: String,
    user_b: String,
    question_id: i64,
    language: String,
    document: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let participants = Participants::new(row.user_a, row.user_b)
            .map_err(|e| StoreError::Corrupt(format!("session {}: {}", row.id, e)))?;
        let language = Language::from_str(&row.language)
            .map_err(|e| StoreError::Corrupt(format!("session {}: {}", row.id, e)))?;
        Ok(Session {
            id: row.id,
            participants,
            question_id: row.question_id,
            language,
            document: Snapshot::from_bytes(row.document),
            created_at: row.created_at,
        })
    }
}

const SESSION_COLUMNS: &str =
    "id, user_a, user_b, question_id, language, document, created_at";

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, user_a, user_b, question_id, language, document, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&session.id)
        .bind(session.participants.first())
        .bind(session.participants.second())
        .bind(session.question_id)
        .bind(session.language.as_str())
        .bind(session.document.as_bytes())
        .bind(session.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(session),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::already_exists("session", &session.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Session::try_from).transpose()
    }

    async fn patch(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE sessions
            SET language = COALESCE(?2, language),
                document = COALESCE(?3, document)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.language.map(|l| l.as_str()))
        .bind(patch.document.as_ref().map(|d| d.as_bytes().to_vec()))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("session", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found("session", id))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE user_a = ?1 OR user_b = ?1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Session::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: i64,
    title: String,
    description: String,
    category: String,
    complexity: String,
    deleted: bool,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let category: Vec<String> = serde_json::from_str(&row.category).map_err(|e| {
            StoreError::Corrupt(format!("question {} category: {}", row.question_id, e))
        })?;
        Ok(Question {
            question_id: row.question_id,
            title: row.title,
            description: row.description,
            category,
            complexity: row.complexity,
            deleted: row.deleted,
        })
    }
}

#[derive(Clone)]
pub struct SqliteQuestionStore {
    pool: SqlitePool,
}

impl SqliteQuestionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let category = serde_json::to_string(&question.category)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO questions (title, description, category, complexity, deleted)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
        )
        .bind(&question.title)
        .bind(&question.description)
        .bind(category)
        .bind(&question.complexity)
        .execute(&self.pool)
        .await?;

        Ok(question.into_question(result.last_insert_rowid()))
    }

    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, title, description, category, complexity, deleted
            FROM questions
            WHERE question_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE questions SET deleted = 1 WHERE question_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn random_match(
        &self,
        criterion: &SelectionCriterion,
        tier: Tier,
    ) -> Result<Option<i64>, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT q.question_id
            FROM questions q
            WHERE q.complexity = ?1
              AND (?3 OR q.deleted = 0)
              AND EXISTS (SELECT 1 FROM json_each(q.category) c WHERE c.value = ?2)
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(&criterion.complexity)
        .bind(&criterion.category)
        .bind(tier == Tier::IncludingDeleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }
}

#[derive(sqlx::FromRow)]
struct ChatRow {
    session_id: String,
    sender_id: String,
    recipient_id: String,
    text: String,
    sent_at_epoch: i64,
}

impl From<ChatRow> for ChatMessage {
    fn from(row: ChatRow) -> Self {
        ChatMessage {
            session_id: row.session_id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            text: row.text,
            sent_at_epoch: row.sent_at_epoch,
        }
    }
}

#[derive(Clone)]
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn append(&self, message: ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_logs (session_id, sender_id, recipient_id, text, sent_at_epoch)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&message.session_id)
        .bind(&message.sender_id)
        .bind(&message.recipient_id)
        .bind(&message.text)
        .bind(message.sent_at_epoch)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_descending(
        &self,
        session_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT session_id, sender_id, recipient_id, text, sent_at_epoch
            FROM chat_logs
            WHERE session_id = ?1
            ORDER BY sent_at_epoch DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn count(&self, session_id: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_logs WHERE session_id = ?1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
