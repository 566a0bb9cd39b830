//! In-process backend access
//!
//! Runs a participant against an `AppState` in the same process, with no
//! HTTP in between. The same relay, stores and archive serve both paths.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::chat::ChatArchive;
use crate::backend::realtime::subscription::envelopes;
use crate::backend::realtime::Relay;
use crate::backend::store::{SessionStore, StoreError};
use crate::backend::AppState;
use crate::client::directory::{ChatLogSource, SessionDirectory};
use crate::client::error::ClientError;
use crate::client::transport::{PublishOutcome, Transport};
use crate::shared::{ChatPage, Envelope, Session, SessionPatch};

const INBOUND_BUFFER: usize = 256;

/// Directory and chat archive backed by the server's stores
#[derive(Clone)]
pub struct LocalDirectory {
    sessions: Arc<dyn SessionStore>,
    archive: ChatArchive,
}

impl LocalDirectory {
    pub fn new(state: &AppState) -> Self {
        Self {
            sessions: state.stores.sessions.clone(),
            archive: state.archive.clone(),
        }
    }
}

#[async_trait]
impl SessionDirectory for LocalDirectory {
    async fn fetch(&self, session_id: &str) -> Result<Session, ClientError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .map_err(|e| ClientError::Backend(e.to_string()))?;
        session.ok_or_else(|| ClientError::Status {
            status: 404,
            message: StoreError::not_found("session", session_id).to_string(),
        })
    }

    async fn patch(&self, session_id: &str, patch: &SessionPatch) -> Result<Session, ClientError> {
        patch.validate()?;
        match self.sessions.patch(session_id, patch).await {
            Ok(session) => Ok(session),
            Err(e @ StoreError::NotFound { .. }) => Err(ClientError::Status {
                status: 404,
                message: e.to_string(),
            }),
            Err(e) => Err(ClientError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl ChatLogSource for LocalDirectory {
    async fn page(&self, session_id: &str, page: u32, limit: u32) -> Result<ChatPage, ClientError> {
        Ok(self.archive.page(session_id, page, limit).await?)
    }
}

/// Transport over an in-process relay
pub struct LocalTransport {
    relay: Relay,
    connected: Arc<AtomicBool>,
    pump: JoinHandle<()>,
}

impl LocalTransport {
    /// Subscribe `user_id` to the session; returns the transport and the inbound envelopes
    pub async fn connect(
        state: &AppState,
        session_id: &str,
        user_id: &str,
    ) -> Result<(Self, mpsc::Receiver<Envelope>), ClientError> {
        let relay = state.relay.clone();
        let subscription = relay.subscribe(session_id, user_id).await?;
        let connected = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);

        let flag = connected.clone();
        let pump = tokio::spawn(async move {
            let stream = envelopes(subscription);
            futures_util::pin_mut!(stream);
            while let Some(envelope) = stream.next().await {
                if tx.send(envelope).await.is_err() {
                    break;
                }
            }
            flag.store(false, Ordering::Release);
        });

        let transport = Self {
            relay,
            connected,
            pump,
        };
        Ok((transport, rx))
    }

    /// Drop the subscription; the peer sees this participant go offline
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.pump.abort();
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, envelope: Envelope) -> PublishOutcome {
        if !self.is_connected() {
            tracing::error!(
                "[Transport] Not connected, dropping {} for {}",
                envelope.category().as_str(),
                envelope.session_id()
            );
            return PublishOutcome::Dropped;
        }

        let category = envelope.category();
        match self.relay.relay(envelope).await {
            Ok(_) => PublishOutcome::Sent,
            Err(e) => {
                tracing::error!("[Transport] Relay rejected {}: {}", category.as_str(), e);
                PublishOutcome::Dropped
            }
        }
    }
}
