/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler. The
 * `FromRef` implementations let handlers extract only the part they use,
 * e.g. `State(relay): State<Relay>`.
 *
 * Everything in here is cheap to clone: stores are `Arc<dyn ...>` and the
 * router keeps its map behind an `Arc`.
 */
use axum::extract::FromRef;

use crate::backend::chat::ChatArchive;
use crate::backend::questions::QuestionPicker;
use crate::backend::realtime::{Relay, SessionRouter};
use crate::backend::store::Stores;

#[derive(Clone)]
pub struct AppState {
    /// Session, question and chat stores
    pub stores: Stores,

    /// Chat history over the chat store
    pub archive: ChatArchive,

    /// Two-tier random question picker
    pub picker: QuestionPicker,

    /// Realtime relay; owns the session router
    pub relay: Relay,
}

impl AppState {
    pub fn new(stores: Stores, channel_capacity: usize) -> Self {
        let archive = ChatArchive::new(stores.chat.clone());
        let picker = QuestionPicker::new(stores.questions.clone());
        let relay = Relay::new(
            SessionRouter::new(channel_capacity),
            stores.sessions.clone(),
            archive.clone(),
        );
        Self {
            stores,
            archive,
            picker,
            relay,
        }
    }

    pub fn router(&self) -> &SessionRouter {
        self.relay.router()
    }
}

impl FromRef<AppState> for Stores {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.stores.clone()
    }
}

impl FromRef<AppState> for ChatArchive {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.archive.clone()
    }
}

impl FromRef<AppState> for QuestionPicker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.picker.clone()
    }
}

impl FromRef<AppState> for Relay {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.relay.clone()
    }
}
