//! Session directory and chat archive access from the client
//!
//! `SessionDirectory` is what a participant needs from the directory: read
//! the session on join and overwrite single fields afterwards.
//! `ChatLogSource` serves archived chat pages. `HttpApi` implements both
//! over the server's JSON API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::client::endpoint::{endpoint, parse_base};
use crate::client::error::ClientError;
use crate::shared::{ChatPage, ClientConfig, Session, SessionPatch};

#[async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn fetch(&self, session_id: &str) -> Result<Session, ClientError>;

    async fn patch(&self, session_id: &str, patch: &SessionPatch) -> Result<Session, ClientError>;
}

#[async_trait]
pub trait ChatLogSource: Send + Sync {
    /// One page of history, oldest first within the page
    async fn page(&self, session_id: &str, page: u32, limit: u32) -> Result<ChatPage, ClientError>;
}

/// JSON API client
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: parse_base(config.base_url())?,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        endpoint(&self.base_url, segments)
    }
}

/// Decode a success body, or turn the server's `{"error", "status"}` body into a `ClientError`
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SessionDirectory for HttpApi {
    async fn fetch(&self, session_id: &str) -> Result<Session, ClientError> {
        let response = self
            .client
            .get(self.url(&["sessions", session_id])?)
            .send()
            .await?;
        read_json(response).await
    }

    async fn patch(&self, session_id: &str, patch: &SessionPatch) -> Result<Session, ClientError> {
        let response = self
            .client
            .patch(self.url(&["sessions", session_id])?)
            .json(patch)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl ChatLogSource for HttpApi {
    async fn page(&self, session_id: &str, page: u32, limit: u32) -> Result<ChatPage, ClientError> {
        let response = self
            .client
            .get(self.url(&["sessions", session_id, "chat"])?)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        read_json(response).await
    }
}
