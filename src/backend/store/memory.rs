/**
 * In-Memory Stores
 *
 * Used when the server runs without a database and throughout the tests.
 * Each store keeps its records behind a tokio `RwLock`; the question store's
 * random generator sits behind a std `Mutex` that is never held across an
 * await.
 */
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::sync::RwLock;

use super::{ChatStore, QuestionStore, SessionStore, StoreError, Tier};
use crate::shared::question::FIRST_QUESTION_ID;
use crate::shared::{ChatMessage, NewQuestion, Question, SelectionCriterion, Session, SessionPatch};

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::already_exists("session", &session.id));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn patch(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("session", id))?;
        session.apply(patch);
        Ok(session.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.participants.contains(user_id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }
}

pub struct MemoryQuestionStore {
    questions: RwLock<BTreeMap<i64, Question>>,
    rng: Mutex<StdRng>,
}

impl Default for MemoryQuestionStore {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible picks for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            questions: RwLock::new(BTreeMap::new()),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let mut questions = self.questions.write().await;
        let id = questions
            .keys()
            .next_back()
            .map_or(FIRST_QUESTION_ID, |last| last + 1);
        let question = question.into_question(id);
        questions.insert(id, question.clone());
        Ok(question)
    }

    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError> {
        Ok(self.questions.read().await.get(&id).cloned())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(match self.questions.write().await.get_mut(&id) {
            Some(question) => {
                question.deleted = true;
                true
            }
            None => false,
        })
    }

    async fn random_match(
        &self,
        criterion: &SelectionCriterion,
        tier: Tier,
    ) -> Result<Option<i64>, StoreError> {
        let candidates: Vec<i64> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| tier == Tier::IncludingDeleted || !q.deleted)
            .filter(|q| criterion.matches(q))
            .map(|q| q.question_id)
            .collect();

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| StoreError::Corrupt("question rng lock poisoned".to_string()))?;
        Ok(candidates.choose(&mut *rng).copied())
    }
}

/// Chat archive keyed by session, each log in arrival order
#[derive(Default)]
pub struct MemoryChatStore {
    logs: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn append(&self, message: ChatMessage) -> Result<(), StoreError> {
        self.logs
            .write()
            .await
            .entry(message.session_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn fetch_descending(
        &self,
        session_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let logs = self.logs.read().await;
        let Some(log) = logs.get(session_id) else {
            return Ok(Vec::new());
        };

        // Ties on the epoch fall back to arrival order, newest first
        let mut ordered: Vec<(usize, &ChatMessage)> = log.iter().enumerate().collect();
        ordered.sort_by(|(ia, a), (ib, b)| {
            b.sent_at_epoch.cmp(&a.sent_at_epoch).then(ib.cmp(ia))
        });

        Ok(ordered
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn count(&self, session_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .logs
            .read()
            .await
            .get(session_id)
            .map_or(0, |log| log.len() as u64))
    }
}
