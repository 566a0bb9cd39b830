//! Chat history loading
//!
//! Page 1 holds the newest messages. `ChatHistory` walks towards older
//! pages and stops once a page comes back short or empty.

use crate::client::directory::ChatLogSource;
use crate::client::error::ClientError;
use crate::shared::message::MAX_PAGE_SIZE;
use crate::shared::ChatMessage;

pub struct ChatHistory<'a, S: ?Sized> {
    source: &'a S,
    session_id: String,
    page_size: u32,
    next_page: u32,
    exhausted: bool,
}

impl<'a, S: ChatLogSource + ?Sized> ChatHistory<'a, S> {
    pub fn new(source: &'a S, session_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            source,
            session_id: session_id.into(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            next_page: 1,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next older page in chronological order; `None` once history is exhausted
    pub async fn load_older(&mut self) -> Result<Option<Vec<ChatMessage>>, ClientError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .source
            .page(&self.session_id, self.next_page, self.page_size)
            .await?;
        self.next_page += 1;

        if (page.messages.len() as u32) < self.page_size {
            self.exhausted = true;
        }
        if page.messages.is_empty() {
            return Ok(None);
        }
        Ok(Some(page.messages))
    }

    /// Every archived message, oldest first
    pub async fn load_all(&mut self) -> Result<Vec<ChatMessage>, ClientError> {
        let mut pages = Vec::new();
        while let Some(page) = self.load_older().await? {
            pages.push(page);
        }
        Ok(pages.into_iter().rev().flatten().collect())
    }
}
