/**
 * Question Bank Records
 *
 * Questions are immutable snapshots referenced by id from sessions. They are
 * never removed, only soft-deleted, so a picked id always resolves.
 */
use serde::{Deserialize, Serialize};

use crate::shared::SharedError;

/// First id handed out by the stores
pub const FIRST_QUESTION_ID: i64 = 1090;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub question_id: i64,
    pub title: String,
    pub description: String,
    pub category: Vec<String>,
    pub complexity: String,
    pub deleted: bool,
}

/// Request body for adding a question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub description: String,
    pub category: Vec<String>,
    pub complexity: String,
}

impl NewQuestion {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.title.trim().is_empty() {
            return Err(SharedError::validation("title", "title must not be empty"));
        }
        if self.category.is_empty() || self.category.iter().any(|c| c.trim().is_empty()) {
            return Err(SharedError::validation(
                "category",
                "at least one non-empty category is required",
            ));
        }
        if self.complexity.trim().is_empty() {
            return Err(SharedError::validation("complexity", "complexity must not be empty"));
        }
        Ok(())
    }

    pub fn into_question(self, question_id: i64) -> Question {
        Question {
            question_id,
            title: self.title,
            description: self.description,
            category: self.category,
            complexity: self.complexity,
            deleted: false,
        }
    }
}

/// Filter for one random pick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionCriterion {
    /// Exact match
    pub complexity: String,
    /// Membership in the question's category set
    pub category: String,
}

impl SelectionCriterion {
    pub fn new(complexity: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            complexity: complexity.into(),
            category: category.into(),
        }
    }

    pub fn validate(&self) -> Result<(), SharedError> {
        if self.complexity.trim().is_empty() {
            return Err(SharedError::validation("complexity", "complexity is required"));
        }
        if self.category.trim().is_empty() {
            return Err(SharedError::validation("category", "category is required"));
        }
        Ok(())
    }

    pub fn matches(&self, question: &Question) -> bool {
        question.complexity == self.complexity
            && question.category.iter().any(|c| c == &self.category)
    }
}
