//! Client Module
//!
//! The participant-side synchronization engine. A participant joins a
//! session, edits the shared document, chats with and changes the language
//! for the peer, and checkpoints the document back to the session directory.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── document.rs     - CRDT replica: decode, apply, encode, local edits
//! ├── checkpoint.rs   - Periodic and on-exit snapshot persistence
//! ├── language.rs     - Language selection echo suppression
//! ├── chat.rs         - Backwards walk over archived chat pages
//! ├── directory.rs    - Session directory and chat archive over HTTP
//! ├── endpoint.rs     - Percent-encoded endpoint URLs
//! ├── transport.rs    - Envelope publishing and the SSE reader
//! ├── local.rs        - In-process directory and transport (`ssr`)
//! ├── session.rs      - CollabSession: join, commands, event loop
//! └── error.rs        - ClientError
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pairsync::client::{CollabSession, Command, HttpApi, HttpTransport};
//! use pairsync::shared::ClientConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder().server_url("http://127.0.0.1:3000").build()?;
//! let api = Arc::new(HttpApi::new(&config)?);
//! let (transport, inbound) = HttpTransport::connect(&config, "abc123", "alice")?;
//!
//! let mut session = CollabSession::join(&config, api, transport, "abc123", "alice").await?;
//! let (commands, command_rx) = tokio::sync::mpsc::channel(32);
//! commands.send(Command::Insert { index: 0, text: "hello".into() }).await?;
//! commands.send(Command::Leave).await?;
//! session.run(inbound, command_rx).await;
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod chat;
pub mod directory;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod language;
#[cfg(feature = "ssr")]
pub mod local;
pub mod session;
pub mod transport;

pub use checkpoint::{Checkpointer, ExitOutcome, SaveStatus};
pub use chat::ChatHistory;
pub use directory::{ChatLogSource, HttpApi, SessionDirectory};
pub use document::DocumentState;
pub use error::ClientError;
pub use language::{LanguageSync, SyncState};
#[cfg(feature = "ssr")]
pub use local::{LocalDirectory, LocalTransport};
pub use session::{CollabSession, Command, SessionView};
pub use transport::{ConnectionStatus, HttpTransport, PublishOutcome, SseDecoder, Transport};
