//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs              - Module exports
//! ├── router.rs           - Router assembly, tracing and CORS layers
//! ├── realtime_routes.rs  - SSE subscription and envelope publishing
//! └── api_routes.rs       - Sessions, chat archive, questions
//! ```

/// Main router creation
pub mod router;

/// Realtime routes
pub mod realtime_routes;

/// Session, chat and question routes
pub mod api_routes;

pub use router::create_router;
