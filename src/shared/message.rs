/**
 * Chat Message Data Structures
 *
 * A chat message is sent point-to-point from one session participant to the
 * other and archived immutably. Ordering is by the sender-assigned
 * `sent_at_epoch` (milliseconds since the Unix epoch), which every sender
 * keeps non-decreasing.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::SharedError;

/// Limit message length to keep a single relay cheap
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Largest chat history page the archive serves
pub const MAX_PAGE_SIZE: u32 = 100;

/// A single archived chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub session_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub text: String,
    /// Sender-assigned, milliseconds since the Unix epoch
    pub sent_at_epoch: i64,
}

impl ChatMessage {
    pub fn new(
        session_id: impl Into<String>,
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        text: impl Into<String>,
        sent_at_epoch: i64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            text: text.into(),
            sent_at_epoch,
        }
    }

    pub fn validate(&self) -> Result<(), SharedError> {
        if self.text.trim().is_empty() {
            return Err(SharedError::validation("text", "message text cannot be empty"));
        }
        if self.text.len() > MAX_MESSAGE_LENGTH {
            return Err(SharedError::validation(
                "text",
                format!("message exceeds {} bytes", MAX_MESSAGE_LENGTH),
            ));
        }
        if self.sender_id == self.recipient_id {
            return Err(SharedError::validation(
                "recipient_id",
                "sender and recipient must differ",
            ));
        }
        if self.sent_at_epoch < 0 {
            return Err(SharedError::validation("sent_at_epoch", "must not be negative"));
        }
        Ok(())
    }

    /// Send time as a UTC timestamp, if representable
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.sent_at_epoch)
    }

    /// Display form used by chat views, e.g. `14:05`
    pub fn formatted_time(&self) -> String {
        self.sent_at()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Page metadata, computed per request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_logs: u64,
}

/// One page of chat history, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPage {
    pub messages: Vec<ChatMessage>,
    pub pagination: Pagination,
}
