/**
 * Collaboration Session
 *
 * One participant's view of a session: the shared document replica, the
 * language selection, the chat stream and the peer's presence. Local edits
 * are applied to the replica and their update fragments published; inbound
 * envelopes are merged as they arrive.
 *
 * Whenever the peer is reported online (on join, on every reconnect of the
 * inbound stream, after the server drops envelopes) the session sends its
 * state vector in a sync request. The peer answers with the operations this
 * replica lacks, and asks back when the request shows it is behind itself.
 *
 * `run` drives everything from one task with `tokio::select!` over three
 * sources: the checkpoint ticker, inbound envelopes and local commands. The
 * document replica is only ever touched from that task. `Command::Leave`
 * (or dropping the command sender) ends the loop with one final checkpoint.
 */
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::client::checkpoint::{Checkpointer, ExitOutcome, SaveStatus};
use crate::client::chat::ChatHistory;
use crate::client::directory::{ChatLogSource, SessionDirectory};
use crate::client::document::DocumentState;
use crate::client::error::ClientError;
use crate::client::language::LanguageSync;
use crate::client::transport::{PublishOutcome, Transport};
use crate::shared::{ChatMessage, ClientConfig, Envelope, Language, SharedError};

/// Local actions fed into [`CollabSession::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert { index: u32, text: String },
    Delete { index: u32, len: u32 },
    SelectLanguage(Language),
    SendChat(String),
    Leave,
}

/// What a UI renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub text: String,
    pub language: Language,
    pub chat: Vec<ChatMessage>,
    pub peer_online: bool,
}

pub struct CollabSession<D, T> {
    session_id: String,
    user_id: String,
    peer_id: String,
    question_id: i64,
    transport: T,
    document: DocumentState,
    language: LanguageSync,
    chat: Vec<ChatMessage>,
    peer_online: bool,
    last_epoch: i64,
    checkpointer: Checkpointer<D>,
    view: watch::Sender<SessionView>,
}

impl<D: SessionDirectory, T: Transport> CollabSession<D, T> {
    /// Load the session record and rebuild the document from its snapshot
    pub async fn join(
        config: &ClientConfig,
        directory: Arc<D>,
        transport: T,
        session_id: &str,
        user_id: &str,
    ) -> Result<Self, ClientError> {
        let session = directory.fetch(session_id).await?;
        let peer_id = session
            .participants
            .peer_of(user_id)
            .ok_or_else(|| {
                SharedError::validation(
                    "user_id",
                    format!("{} is not a participant of {}", user_id, session_id),
                )
            })?
            .to_string();

        let document = DocumentState::decode(session.document.as_bytes());
        tracing::info!(
            "[Session] {} joined {} with {} (question {}, {})",
            user_id,
            session_id,
            peer_id,
            session.question_id,
            session.language
        );

        let (view, _) = watch::channel(SessionView {
            text: document.text(),
            language: session.language,
            ..SessionView::default()
        });

        Ok(Self {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            peer_id,
            question_id: session.question_id,
            transport,
            document,
            language: LanguageSync::new(session.language),
            chat: Vec::new(),
            peer_online: false,
            last_epoch: 0,
            checkpointer: Checkpointer::new(directory, session_id, config),
            view,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn question_id(&self) -> i64 {
        self.question_id
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn language(&self) -> Language {
        self.language.current()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn peer_online(&self) -> bool {
        self.peer_online
    }

    pub fn watch_view(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.checkpointer.status()
    }

    /// Prepend the archived chat history to the chat view
    pub async fn load_chat_history<S: ChatLogSource + ?Sized>(
        &mut self,
        source: &S,
        page_size: u32,
    ) -> Result<usize, ClientError> {
        let history = ChatHistory::new(source, &self.session_id, page_size)
            .load_all()
            .await?;
        let loaded = history.len();
        if let Some(newest) = history.last() {
            self.last_epoch = self.last_epoch.max(newest.sent_at_epoch);
        }

        let live = std::mem::take(&mut self.chat);
        self.chat = history;
        for message in live {
            self.push_chat(message);
        }
        self.refresh_view();
        Ok(loaded)
    }

    pub async fn insert(&mut self, index: u32, text: &str) -> PublishOutcome {
        let update = self.document.insert(index, text);
        self.refresh_view();
        self.publish_update(update).await
    }

    pub async fn delete(&mut self, index: u32, len: u32) -> PublishOutcome {
        let update = self.document.delete(index, len);
        self.refresh_view();
        self.publish_update(update).await
    }

    /// Ask the peer for every operation this replica has not seen
    pub async fn request_sync(&self) -> PublishOutcome {
        self.transport
            .publish(Envelope::sync_request(
                &self.session_id,
                &self.user_id,
                self.document.state_vector(),
            ))
            .await
    }

    async fn answer_sync(&self, sender_id: &str, state_vector: &[u8]) {
        let missing = match self.document.diff(state_vector) {
            Ok(missing) => missing,
            Err(e) => {
                tracing::warn!("[Session] Ignoring sync request from {}: {}", sender_id, e);
                return;
            }
        };
        self.publish_update(Some(missing)).await;

        if let Ok(true) = self.document.is_behind(state_vector) {
            tracing::debug!("[Session] {} is ahead, asking back", sender_id);
            self.request_sync().await;
        }
    }

    async fn publish_update(&self, update: Option<Vec<u8>>) -> PublishOutcome {
        match update {
            Some(update) => {
                self.transport
                    .publish(Envelope::document_update(&self.session_id, &self.user_id, update))
                    .await
            }
            None => PublishOutcome::Sent,
        }
    }

    /// The editor reported a language selection
    ///
    /// Returns the language published to the peer, if any.
    pub async fn select_language(&mut self, language: Language) -> Option<Language> {
        let publish = self.language.on_local_selection(language)?;
        self.refresh_view();
        self.transport
            .publish(Envelope::language_change(
                &self.session_id,
                &self.user_id,
                &self.peer_id,
                publish,
            ))
            .await;
        Some(publish)
    }

    /// Send a chat message to the peer
    ///
    /// The message joins the chat view when the router echoes it back.
    pub async fn send_chat(&mut self, text: &str) -> Result<PublishOutcome, ClientError> {
        let epoch = chrono::Utc::now().timestamp_millis().max(self.last_epoch + 1);
        let message = ChatMessage::new(&self.session_id, &self.user_id, &self.peer_id, text, epoch);
        message.validate()?;
        self.last_epoch = epoch;
        Ok(self.transport.publish(Envelope::Chat(message)).await)
    }

    /// Merge one inbound envelope
    pub async fn handle(&mut self, envelope: Envelope) {
        if envelope.session_id() != self.session_id {
            tracing::warn!(
                "[Session] Ignoring {} for foreign session {}",
                envelope.category().as_str(),
                envelope.session_id()
            );
            return;
        }

        match envelope {
            Envelope::DocumentUpdate {
                sender_id, update, ..
            } => {
                if sender_id == self.user_id {
                    return;
                }
                if let Err(e) = self.document.apply_remote_update(update.as_bytes()) {
                    tracing::warn!("[Session] Dropping update from {}: {}", sender_id, e);
                    return;
                }
            }
            Envelope::SyncRequest {
                sender_id,
                state_vector,
                ..
            } => {
                if sender_id != self.user_id {
                    self.answer_sync(&sender_id, state_vector.as_bytes()).await;
                }
                return;
            }
            Envelope::Chat(message) => {
                if message.sender_id == self.user_id {
                    self.last_epoch = self.last_epoch.max(message.sent_at_epoch);
                }
                self.push_chat(message);
            }
            Envelope::LanguageChange {
                recipient_id,
                language,
                ..
            } => {
                if recipient_id != self.user_id {
                    return;
                }
                self.language.on_remote_notice(language);
            }
            Envelope::Presence { user_id, online, .. } => {
                if user_id != self.peer_id {
                    return;
                }
                tracing::info!(
                    "[Session] {} is {}",
                    user_id,
                    if online { "online" } else { "offline" }
                );
                self.peer_online = online;
                if online {
                    self.request_sync().await;
                }
            }
        }
        self.refresh_view();
    }

    /// Insert in chronological position, skipping redeliveries
    fn push_chat(&mut self, message: ChatMessage) {
        if self.chat.contains(&message) {
            return;
        }
        let position = self
            .chat
            .partition_point(|existing| existing.sent_at_epoch <= message.sent_at_epoch);
        self.chat.insert(position, message);
    }

    fn refresh_view(&self) {
        self.view.send_replace(SessionView {
            text: self.document.text(),
            language: self.language.current(),
            chat: self.chat.clone(),
            peer_online: self.peer_online,
        });
    }

    /// Persist the document if it changed since the last save
    pub async fn checkpoint(&mut self) {
        let blob = self.document.encode();
        if !self.checkpointer.is_stale(&blob) {
            return;
        }
        // failures are retried on the next tick
        let _ = self.checkpointer.persist(blob).await;
    }

    /// Final checkpoint, bounded by the exit timeout
    pub async fn leave(&mut self) -> ExitOutcome {
        let blob = self.document.encode();
        if !self.checkpointer.is_stale(&blob) {
            return ExitOutcome::Persisted;
        }
        self.checkpointer.persist_before_exit(blob).await
    }

    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Insert { index, text } => {
                self.insert(index, &text).await;
            }
            Command::Delete { index, len } => {
                self.delete(index, len).await;
            }
            Command::SelectLanguage(language) => {
                self.select_language(language).await;
            }
            Command::SendChat(text) => {
                if let Err(e) = self.send_chat(&text).await {
                    tracing::warn!("[Session] Chat message rejected: {}", e);
                }
            }
            Command::Leave => {}
        }
    }

    /// Event loop; returns once the participant leaves
    pub async fn run(
        &mut self,
        mut inbound: mpsc::Receiver<Envelope>,
        mut commands: mpsc::Receiver<Command>,
    ) -> ExitOutcome {
        let mut ticker = self.checkpointer.interval();
        let mut inbound_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.checkpoint().await,
                envelope = inbound.recv(), if inbound_open => match envelope {
                    Some(envelope) => self.handle(envelope).await,
                    None => {
                        tracing::warn!("[Session] Inbound stream for {} ended", self.session_id);
                        inbound_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Leave) | None => break,
                    Some(command) => self.execute(command).await,
                },
            }
        }

        let outcome = self.leave().await;
        tracing::info!("[Session] {} left {} ({:?})", self.user_id, self.session_id, outcome);
        outcome
    }
}
