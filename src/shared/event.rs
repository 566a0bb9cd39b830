/**
 * Router Envelopes
 *
 * Every message carried between the two participants of a session is an
 * `Envelope`. The category decides the addressing:
 * - document updates and sync requests go to the session's shared
 *   document topic
 * - chat, language-change and presence go to a participant's own queue
 *
 * A sync request carries the sender's encoded state vector. The peer answers
 * with a document update holding everything the sender has not seen.
 *
 * Envelopes are JSON objects tagged by `kind`.
 */
use serde::{Deserialize, Serialize};

use crate::shared::{ChatMessage, Language, Snapshot};

/// Message category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DocumentUpdate,
    SyncRequest,
    Chat,
    LanguageChange,
    Presence,
}

impl Category {
    /// SSE event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DocumentUpdate => "document_update",
            Category::SyncRequest => "sync_request",
            Category::Chat => "chat",
            Category::LanguageChange => "language_change",
            Category::Presence => "presence",
        }
    }

    /// Last path segment of the endpoint this category is posted to,
    /// under `/realtime/{session_id}/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            Category::DocumentUpdate => "document",
            Category::SyncRequest => "sync",
            Category::Chat => "chat",
            Category::LanguageChange => "language",
            Category::Presence => "presence",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    /// CRDT update fragment for the shared document
    DocumentUpdate {
        session_id: String,
        sender_id: String,
        update: Snapshot,
    },
    /// Ask the peer for the operations missing from `state_vector`
    SyncRequest {
        session_id: String,
        sender_id: String,
        state_vector: Snapshot,
    },
    Chat(ChatMessage),
    LanguageChange {
        session_id: String,
        sender_id: String,
        recipient_id: String,
        language: Language,
    },
    /// Peer came online or went away
    Presence {
        session_id: String,
        user_id: String,
        online: bool,
    },
}

impl Envelope {
    pub fn document_update(
        session_id: impl Into<String>,
        sender_id: impl Into<String>,
        update: impl Into<Snapshot>,
    ) -> Self {
        Self::DocumentUpdate {
            session_id: session_id.into(),
            sender_id: sender_id.into(),
            update: update.into(),
        }
    }

    pub fn sync_request(
        session_id: impl Into<String>,
        sender_id: impl Into<String>,
        state_vector: impl Into<Snapshot>,
    ) -> Self {
        Self::SyncRequest {
            session_id: session_id.into(),
            sender_id: sender_id.into(),
            state_vector: state_vector.into(),
        }
    }

    pub fn language_change(
        session_id: impl Into<String>,
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        language: Language,
    ) -> Self {
        Self::LanguageChange {
            session_id: session_id.into(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            language,
        }
    }

    pub fn presence(session_id: impl Into<String>, user_id: impl Into<String>, online: bool) -> Self {
        Self::Presence {
            session_id: session_id.into(),
            user_id: user_id.into(),
            online,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Envelope::DocumentUpdate { .. } => Category::DocumentUpdate,
            Envelope::SyncRequest { .. } => Category::SyncRequest,
            Envelope::Chat(_) => Category::Chat,
            Envelope::LanguageChange { .. } => Category::LanguageChange,
            Envelope::Presence { .. } => Category::Presence,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Envelope::DocumentUpdate { session_id, .. }
            | Envelope::SyncRequest { session_id, .. }
            | Envelope::LanguageChange { session_id, .. }
            | Envelope::Presence { session_id, .. } => session_id,
            Envelope::Chat(message) => &message.session_id,
        }
    }

    /// Originating participant; presence notices have none
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            Envelope::DocumentUpdate { sender_id, .. }
            | Envelope::SyncRequest { sender_id, .. }
            | Envelope::LanguageChange { sender_id, .. } => Some(sender_id),
            Envelope::Chat(message) => Some(&message.sender_id),
            Envelope::Presence { .. } => None,
        }
    }
}
