/**
 * Question Picker
 *
 * Picks one question id uniformly at random for a selection criterion:
 *
 * 1. among matching questions that are not soft-deleted;
 * 2. failing that, among all matching questions, deleted ones included;
 * 3. failing that, `PickError::NotFound`.
 */
use std::sync::Arc;
use thiserror::Error;

use crate::backend::store::{QuestionStore, StoreError, Tier};
use crate::shared::{SelectionCriterion, SharedError};

#[derive(Debug, Error)]
pub enum PickError {
    #[error(transparent)]
    Invalid(#[from] SharedError),

    /// No question matches in either tier
    #[error("no question found for the given complexity and category")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct QuestionPicker {
    store: Arc<dyn QuestionStore>,
}

impl QuestionPicker {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    pub async fn pick(&self, criterion: &SelectionCriterion) -> Result<i64, PickError> {
        criterion.validate()?;

        for tier in [Tier::Active, Tier::IncludingDeleted] {
            if let Some(id) = self.store.random_match(criterion, tier).await? {
                tracing::debug!(
                    "[Picker] Picked question {} ({:?}) for {}/{}",
                    id,
                    tier,
                    criterion.complexity,
                    criterion.category
                );
                return Ok(id);
            }
        }

        tracing::info!(
            "[Picker] No question for {}/{}",
            criterion.complexity,
            criterion.category
        );
        Err(PickError::NotFound)
    }
}
