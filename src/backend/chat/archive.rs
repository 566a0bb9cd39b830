/**
 * Chat Log Archive
 *
 * Append-only history of a session's chat. Pages are cut from the newest end:
 * page 1 holds the most recent `limit` messages, page 2 the ones before
 * them, and so on. Each page is fetched newest-first and reversed, so the
 * caller always receives it in chronological order.
 */
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::store::ChatStore;
use crate::shared::{ChatMessage, ChatPage, Pagination, SharedError};

pub use crate::shared::message::MAX_PAGE_SIZE;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone)]
pub struct ChatArchive {
    store: Arc<dyn ChatStore>,
}

impl ChatArchive {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Validate and archive one message
    pub async fn append(&self, message: ChatMessage) -> Result<(), BackendError> {
        message.validate()?;
        tracing::debug!(
            "[Chat] Archiving message in {} from {} at {}",
            message.session_id,
            message.sender_id,
            message.sent_at_epoch
        );
        self.store.append(message).await?;
        Ok(())
    }

    /// The `page`-th page of history, oldest message first
    pub async fn page(
        &self,
        session_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<ChatPage, BackendError> {
        if page == 0 {
            return Err(SharedError::validation("page", "page must be at least 1").into());
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(SharedError::validation(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_SIZE),
            )
            .into());
        }

        let total_logs = self.store.count(session_id).await?;
        let offset = u64::from(page - 1) * u64::from(limit);

        let mut messages = if offset >= total_logs {
            Vec::new()
        } else {
            self.store.fetch_descending(session_id, offset, limit).await?
        };
        messages.reverse();

        let total_pages = u32::try_from(total_logs.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);

        tracing::debug!(
            "[Chat] Page {}/{} of {} returned {} messages",
            page,
            total_pages,
            session_id,
            messages.len()
        );

        Ok(ChatPage {
            messages,
            pagination: Pagination {
                page,
                limit,
                total_pages,
                total_logs,
            },
        })
    }
}
