/**
 * Session Records
 *
 * A session is one pairing of exactly two users working on one question.
 * The record is created once when a match is confirmed and afterwards only
 * receives single-field overwrites of `language` and `document`.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::{SharedError, Snapshot};

/// Editor language of a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" => Ok(Language::JavaScript),
            "python" => Ok(Language::Python),
            other => Err(SharedError::validation(
                "language",
                format!("unsupported language '{}'", other),
            )),
        }
    }
}

/// The ordered pair of users in a session
///
/// Always exactly two distinct, non-empty user ids. Serialized as a two
/// element JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Participants([String; 2]);

impl Participants {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Result<Self, SharedError> {
        let first = first.into();
        let second = second.into();
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(SharedError::validation(
                "participants",
                "user ids must not be empty",
            ));
        }
        if first == second {
            return Err(SharedError::validation(
                "participants",
                "a session needs two distinct users",
            ));
        }
        Ok(Self([first, second]))
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn second(&self) -> &str {
        &self.0[1]
    }

    /// Position of `user_id` in the pair
    pub fn index_of(&self, user_id: &str) -> Option<usize> {
        self.0.iter().position(|u| u == user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.index_of(user_id).is_some()
    }

    /// The participant that is not `user_id`, if `user_id` is one of the pair
    pub fn peer_of(&self, user_id: &str) -> Option<&str> {
        match self.index_of(user_id)? {
            0 => Some(self.second()),
            _ => Some(self.first()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Participants {
    type Error = SharedError;

    fn try_from(users: Vec<String>) -> Result<Self, Self::Error> {
        let [first, second]: [String; 2] = users.try_into().map_err(|users: Vec<String>| {
            SharedError::validation(
                "participants",
                format!("expected exactly two users, got {}", users.len()),
            )
        })?;
        Participants::new(first, second)
    }
}

impl From<Participants> for Vec<String> {
    fn from(participants: Participants) -> Self {
        participants.0.into()
    }
}

/// A collaboration room record as held by the session directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Caller-assigned, globally unique
    pub id: String,
    pub participants: Participants,
    /// Chosen once at match time
    pub question_id: i64,
    pub language: Language,
    /// Last checkpointed document state
    #[serde(default)]
    pub document: Snapshot,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Apply a patch as independent single-field overwrites
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(document) = &patch.document {
            self.document = document.clone();
        }
    }
}

/// Request body for creating a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSession {
    pub id: String,
    pub participants: Participants,
    pub question_id: i64,
    #[serde(default)]
    pub language: Language,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.id.trim().is_empty() {
            return Err(SharedError::validation("id", "session id must not be empty"));
        }
        Ok(())
    }

    pub fn into_session(self, created_at: DateTime<Utc>) -> Session {
        Session {
            id: self.id,
            participants: self.participants,
            question_id: self.question_id,
            language: self.language,
            document: Snapshot::empty(),
            created_at,
        }
    }
}

/// Last-writer-wins update of a session's mutable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Snapshot>,
}

impl SessionPatch {
    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            document: None,
        }
    }

    pub fn document(document: impl Into<Snapshot>) -> Self {
        Self {
            language: None,
            document: Some(document.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.document.is_none()
    }

    pub fn validate(&self) -> Result<(), SharedError> {
        if self.is_empty() {
            return Err(SharedError::validation(
                "patch",
                "nothing to update: expected language or document",
            ));
        }
        Ok(())
    }
}
