/**
 * Relay
 *
 * Server-side operations behind the realtime endpoints. The relay resolves
 * a session's participant pair (opening the router entry from the session
 * directory on first use), validates addressing, performs the side effects
 * that belong to a message (archiving chat, persisting a language change)
 * and hands the envelope to the router.
 *
 * The in-process client transport calls the same operations.
 */
use std::sync::Arc;

use crate::backend::chat::ChatArchive;
use crate::backend::error::BackendError;
use crate::backend::realtime::router::{RouteError, SessionRouter, Subscription};
use crate::backend::store::{SessionStore, StoreError};
use crate::shared::{ChatMessage, Envelope, Language, Participants, SessionPatch, SharedError, Snapshot};

#[derive(Clone)]
pub struct Relay {
    router: SessionRouter,
    sessions: Arc<dyn SessionStore>,
    archive: ChatArchive,
}

impl Relay {
    pub fn new(router: SessionRouter, sessions: Arc<dyn SessionStore>, archive: ChatArchive) -> Self {
        Self {
            router,
            sessions,
            archive,
        }
    }

    pub fn router(&self) -> &SessionRouter {
        &self.router
    }

    /// Participant pair of a session, opening its router entry if needed
    async fn ensure_open(&self, session_id: &str) -> Result<Participants, BackendError> {
        if let Some(participants) = self.router.participants(session_id) {
            return Ok(participants);
        }
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| StoreError::not_found("session", session_id))?;
        self.router.open(session_id, &session.participants)?;
        Ok(session.participants)
    }

    /// Subscribe a participant to their session
    pub async fn subscribe(&self, session_id: &str, user_id: &str) -> Result<Subscription, BackendError> {
        let participants = self.ensure_open(session_id).await?;
        if !participants.contains(user_id) {
            return Err(RouteError::NotParticipant {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            }
            .into());
        }
        Ok(self.router.subscribe(session_id, user_id)?)
    }

    pub async fn relay_document(
        &self,
        session_id: &str,
        sender_id: &str,
        update: Snapshot,
    ) -> Result<usize, BackendError> {
        if update.is_empty() {
            return Err(SharedError::validation("update", "document update is empty").into());
        }
        self.ensure_open(session_id).await?;
        Ok(self.router.publish_document(session_id, sender_id, update)?)
    }

    pub async fn relay_sync(
        &self,
        session_id: &str,
        sender_id: &str,
        state_vector: Snapshot,
    ) -> Result<usize, BackendError> {
        self.ensure_open(session_id).await?;
        Ok(self.router.request_sync(session_id, sender_id, state_vector)?)
    }

    /// Archive a chat message, then deliver it to both participants
    pub async fn relay_chat(&self, message: ChatMessage) -> Result<usize, BackendError> {
        message.validate()?;
        self.ensure_open(&message.session_id).await?;
        self.router
            .check_direct(&message.session_id, &message.sender_id, &message.recipient_id)?;

        self.archive.append(message.clone()).await?;
        Ok(self.router.send_chat(&message)?)
    }

    /// Persist the session's new language, then notify the recipient
    pub async fn relay_language(
        &self,
        session_id: &str,
        sender_id: &str,
        recipient_id: &str,
        language: Language,
    ) -> Result<usize, BackendError> {
        self.ensure_open(session_id).await?;
        self.router.check_direct(session_id, sender_id, recipient_id)?;

        self.sessions
            .patch(session_id, &SessionPatch::language(language))
            .await?;
        tracing::info!(
            "[Relay] {} switched session {} to {}",
            sender_id,
            session_id,
            language
        );
        Ok(self
            .router
            .send_language(session_id, sender_id, recipient_id, language)?)
    }

    /// Dispatch an envelope posted by a participant
    pub async fn relay(&self, envelope: Envelope) -> Result<usize, BackendError> {
        match envelope {
            Envelope::DocumentUpdate {
                session_id,
                sender_id,
                update,
            } => self.relay_document(&session_id, &sender_id, update).await,
            Envelope::SyncRequest {
                session_id,
                sender_id,
                state_vector,
            } => self.relay_sync(&session_id, &sender_id, state_vector).await,
            Envelope::Chat(message) => self.relay_chat(message).await,
            Envelope::LanguageChange {
                session_id,
                sender_id,
                recipient_id,
                language,
            } => {
                self.relay_language(&session_id, &sender_id, &recipient_id, language)
                    .await
            }
            Envelope::Presence { .. } => Err(SharedError::validation(
                "kind",
                "presence is maintained by the server",
            )
            .into()),
        }
    }
}
