/**
 * Session Router
 *
 * Per-session fan-out for the two participants of a session. Each opened
 * session owns:
 * - a document topic every subscriber of the session receives, carrying
 *   document updates and sync requests;
 * - one point-to-point queue per participant, for chat, language notices
 *   and presence.
 *
 * All channels are `tokio::sync::broadcast`; sending never blocks. A send
 * with no live receiver is dropped, which is the expected outcome while the
 * peer is offline.
 *
 * The router map sits behind a std `Mutex` that is only held for lookups
 * and inserts, never across an await.
 */
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::shared::{ChatMessage, Envelope, Language, Participants, Snapshot};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("session '{0}' is not open")]
    SessionNotFound(String),

    #[error("user '{user_id}' is not a participant of session '{session_id}'")]
    NotParticipant { session_id: String, user_id: String },

    /// The session is already open with a different pair of users
    #[error("session '{session_id}' already has two different participants")]
    TwoPartyViolation { session_id: String },

    #[error("'{recipient_id}' is not the peer of '{sender_id}'")]
    WrongRecipient {
        sender_id: String,
        recipient_id: String,
    },

    #[error("envelope for session '{envelope}' posted to session '{path}'")]
    SessionMismatch { path: String, envelope: String },

    #[error("router state unavailable")]
    Poisoned,
}

/// Channels of one open session
struct SessionChannels {
    participants: Participants,
    document: broadcast::Sender<Envelope>,
    queues: [broadcast::Sender<Envelope>; 2],
    /// Live subscriptions per participant
    online: [AtomicUsize; 2],
}

impl SessionChannels {
    fn new(participants: Participants, capacity: usize) -> Self {
        Self {
            participants,
            document: broadcast::channel(capacity).0,
            queues: [broadcast::channel(capacity).0, broadcast::channel(capacity).0],
            online: [AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }

    fn index_of(&self, session_id: &str, user_id: &str) -> Result<usize, RouteError> {
        self.participants
            .index_of(user_id)
            .ok_or_else(|| RouteError::NotParticipant {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            })
    }

    /// Sender and recipient positions; the recipient must be the sender's peer
    fn direct_pair(
        &self,
        session_id: &str,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<(usize, usize), RouteError> {
        let sender = self.index_of(session_id, sender_id)?;
        if self.participants.peer_of(sender_id) != Some(recipient_id) {
            return Err(RouteError::WrongRecipient {
                sender_id: sender_id.to_string(),
                recipient_id: recipient_id.to_string(),
            });
        }
        Ok((sender, 1 - sender))
    }

    fn is_idle(&self) -> bool {
        self.online.iter().all(|c| c.load(Ordering::SeqCst) == 0)
            && self.document.receiver_count() == 0
    }
}

fn deliver(queue: &broadcast::Sender<Envelope>, envelope: Envelope) -> usize {
    match queue.send(envelope) {
        Ok(count) => count,
        Err(_) => {
            tracing::debug!("[Router] No live receiver, envelope dropped");
            0
        }
    }
}

/// Router keyed by session id
#[derive(Clone)]
pub struct SessionRouter {
    sessions: Arc<Mutex<HashMap<String, Arc<SessionChannels>>>>,
    capacity: usize,
}

impl Default for SessionRouter {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl SessionRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<SessionChannels>>>, RouteError> {
        self.sessions.lock().map_err(|_| RouteError::Poisoned)
    }

    fn channels(&self, session_id: &str) -> Result<Arc<SessionChannels>, RouteError> {
        self.lock()?
            .get(session_id)
            .cloned()
            .ok_or_else(|| RouteError::SessionNotFound(session_id.to_string()))
    }

    /// Open the session's channels for `participants`
    ///
    /// Opening an already open session is a no-op as long as the pair is the
    /// same one.
    pub fn open(&self, session_id: &str, participants: &Participants) -> Result<(), RouteError> {
        let mut sessions = self.lock()?;
        match sessions.get(session_id) {
            Some(existing) if &existing.participants != participants => {
                tracing::warn!(
                    "[Router] Rejected second participant pair for session {}",
                    session_id
                );
                Err(RouteError::TwoPartyViolation {
                    session_id: session_id.to_string(),
                })
            }
            Some(_) => Ok(()),
            None => {
                sessions.insert(
                    session_id.to_string(),
                    Arc::new(SessionChannels::new(participants.clone(), self.capacity)),
                );
                tracing::info!("[Router] Opened session {}", session_id);
                Ok(())
            }
        }
    }

    /// Participant pair of an open session
    pub fn participants(&self, session_id: &str) -> Option<Participants> {
        self.channels(session_id)
            .ok()
            .map(|channels| channels.participants.clone())
    }

    pub fn is_online(&self, session_id: &str, user_id: &str) -> bool {
        self.channels(session_id)
            .ok()
            .and_then(|channels| {
                let index = channels.participants.index_of(user_id)?;
                Some(channels.online[index].load(Ordering::SeqCst) > 0)
            })
            .unwrap_or(false)
    }

    /// Attach `user_id` to an open session
    ///
    /// The first live subscription of a user marks them online and tells the
    /// peer. Dropping the last one marks them offline again.
    pub fn subscribe(&self, session_id: &str, user_id: &str) -> Result<Subscription, RouteError> {
        let channels = self.channels(session_id)?;
        let index = channels.index_of(session_id, user_id)?;
        let peer = 1 - index;

        let document = channels.document.subscribe();
        let direct = channels.queues[index].subscribe();

        let previous = channels.online[index].fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            deliver(
                &channels.queues[peer],
                Envelope::presence(session_id, user_id, true),
            );
            tracing::info!("[Router] {} joined session {}", user_id, session_id);
        }
        let peer_online = channels.online[peer].load(Ordering::SeqCst) > 0;

        Ok(Subscription {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            peer_id: channels.participants.peer_of(user_id).map(str::to_string).unwrap_or_default(),
            peer_online,
            document,
            direct,
            presence: PresenceGuard {
                channels,
                index,
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            },
        })
    }

    /// Broadcast a document update to every subscriber of the session
    pub fn publish_document(
        &self,
        session_id: &str,
        sender_id: &str,
        update: Snapshot,
    ) -> Result<usize, RouteError> {
        let channels = self.channels(session_id)?;
        channels.index_of(session_id, sender_id)?;
        let delivered = deliver(
            &channels.document,
            Envelope::document_update(session_id, sender_id, update),
        );
        tracing::debug!(
            "[Router] Document update from {} in {} reached {} subscribers",
            sender_id,
            session_id,
            delivered
        );
        Ok(delivered)
    }

    /// Broadcast a sync request on the document topic
    pub fn request_sync(
        &self,
        session_id: &str,
        sender_id: &str,
        state_vector: Snapshot,
    ) -> Result<usize, RouteError> {
        let channels = self.channels(session_id)?;
        channels.index_of(session_id, sender_id)?;
        Ok(deliver(
            &channels.document,
            Envelope::sync_request(session_id, sender_id, state_vector),
        ))
    }

    /// Check that a point-to-point message is addressed sender to peer
    pub fn check_direct(
        &self,
        session_id: &str,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<(), RouteError> {
        self.channels(session_id)?
            .direct_pair(session_id, sender_id, recipient_id)
            .map(|_| ())
    }

    /// Deliver a chat message to the recipient and back to the sender
    ///
    /// The sender's copy is its confirmation that the message went out.
    pub fn send_chat(&self, message: &ChatMessage) -> Result<usize, RouteError> {
        let channels = self.channels(&message.session_id)?;
        let (sender, recipient) =
            channels.direct_pair(&message.session_id, &message.sender_id, &message.recipient_id)?;

        let delivered = deliver(&channels.queues[recipient], Envelope::Chat(message.clone()))
            + deliver(&channels.queues[sender], Envelope::Chat(message.clone()));
        tracing::debug!(
            "[Router] Chat from {} in {} reached {} queues",
            message.sender_id,
            message.session_id,
            delivered
        );
        Ok(delivered)
    }

    /// Deliver a language change notice to the recipient only
    pub fn send_language(
        &self,
        session_id: &str,
        sender_id: &str,
        recipient_id: &str,
        language: Language,
    ) -> Result<usize, RouteError> {
        let channels = self.channels(session_id)?;
        let (_, recipient) = channels.direct_pair(session_id, sender_id, recipient_id)?;
        Ok(deliver(
            &channels.queues[recipient],
            Envelope::language_change(session_id, sender_id, recipient_id, language),
        ))
    }

    /// Drop sessions nobody is subscribed to; returns how many were removed
    pub fn cleanup_idle(&self) -> usize {
        let Ok(mut sessions) = self.lock() else {
            tracing::error!("[Router] Cleanup skipped, router state unavailable");
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, channels| !channels.is_idle());
        before - sessions.len()
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }
}

/// Marks a participant offline when their subscription goes away
struct PresenceGuard {
    channels: Arc<SessionChannels>,
    index: usize,
    session_id: String,
    user_id: String,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        let previous = self.channels.online[self.index].fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            deliver(
                &self.channels.queues[1 - self.index],
                Envelope::presence(&self.session_id, &self.user_id, false),
            );
            tracing::info!("[Router] {} left session {}", self.user_id, self.session_id);
        }
    }
}

/// A participant's live view of a session
pub struct Subscription {
    pub session_id: String,
    pub user_id: String,
    pub peer_id: String,
    /// Whether the peer was online when this subscription was made
    pub peer_online: bool,
    pub document: broadcast::Receiver<Envelope>,
    pub direct: broadcast::Receiver<Envelope>,
    presence: PresenceGuard,
}

impl Subscription {
    /// Presence of the peer right now
    pub fn peer_is_online(&self) -> bool {
        let peer = 1 - self.presence.index;
        self.presence.channels.online[peer].load(Ordering::SeqCst) > 0
    }
}
