//! Language selection sync
//!
//! Applying a remote language change to the editor makes the editor report a
//! "selection" of that language, which would be published straight back to
//! the peer. `LanguageSync` swallows that one echo.

use crate::shared::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A remote change to this language was applied; its echo is expected
    SuppressingEcho(Language),
}

#[derive(Debug, Clone)]
pub struct LanguageSync {
    current: Language,
    state: SyncState,
}

impl LanguageSync {
    pub fn new(initial: Language) -> Self {
        Self {
            current: initial,
            state: SyncState::Idle,
        }
    }

    pub fn current(&self) -> Language {
        self.current
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The editor reported a selection; returns the language to publish, if any
    pub fn on_local_selection(&mut self, language: Language) -> Option<Language> {
        if let SyncState::SuppressingEcho(expected) = self.state {
            self.state = SyncState::Idle;
            if expected == language {
                tracing::debug!("[Language] Swallowed echo of remote change to {}", language);
                return None;
            }
        }

        if language == self.current {
            return None;
        }
        self.current = language;
        Some(language)
    }

    /// The peer changed the language; returns the language to apply
    pub fn on_remote_notice(&mut self, language: Language) -> Language {
        if language != self.current {
            self.state = SyncState::SuppressingEcho(language);
        }
        self.current = language;
        language
    }
}
