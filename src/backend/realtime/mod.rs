//! Real-time Module
//!
//! Presence and broadcast routing between the two participants of a
//! session, streamed to clients over Server-Sent Events.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - SessionRouter: document topic, per-user queues, presence
//! ├── relay.rs        - Relay: validation and side effects, then routing
//! ├── subscription.rs - SSE stream over a router subscription
//! └── handlers.rs     - HTTP handlers
//! ```
//!
//! # Addressing
//!
//! | Envelope | Goes to |
//! |---|---|
//! | `document_update` | every subscriber of the session |
//! | `chat` | the recipient's queue and the sender's queue |
//! | `language_change` | the recipient's queue |
//! | `presence` | the other participant's queue |

/// Per-session channels and presence
pub mod router;

/// Server operations behind the realtime endpoints
pub mod relay;

/// Server-Sent Events stream
pub mod subscription;

/// HTTP handlers
pub mod handlers;

pub use relay::Relay;
pub use router::{RouteError, SessionRouter, Subscription};
