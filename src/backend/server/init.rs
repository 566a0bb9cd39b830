/**
 * Server Initialization
 *
 * Builds the Axum application:
 * 1. pick the stores (SQLite when a database URL is configured and
 *    reachable, in-memory otherwise);
 * 2. create the app state (archive, picker, relay and router);
 * 3. assemble the routes;
 * 4. start the periodic cleanup of idle router entries.
 *
 * A database that cannot be reached is logged and the server continues on
 * in-memory stores.
 */
use axum::Router;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::realtime::SessionRouter;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use crate::backend::store::{connect_sqlite, Stores};

/// Create and configure the Axum application
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("Initializing PairSync server");

    let stores = load_stores(config).await;
    let app_state = AppState::new(stores, config.channel_capacity);

    let app = create_router(app_state.clone());

    spawn_cleanup(
        app_state.router().clone(),
        Duration::from_secs(config.cleanup_interval_secs),
    );
    tracing::info!("Router configured with periodic cleanup task");

    app
}

/// Stores for `config`, falling back to memory
pub async fn load_stores(config: &ServerConfig) -> Stores {
    let Some(url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set. Using in-memory stores.");
        return Stores::memory();
    };

    tracing::info!("Connecting to database...");
    match connect_sqlite(url).await {
        Ok(pool) => {
            tracing::info!("Database connected and migrations applied");
            Stores::sqlite(pool)
        }
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            tracing::warn!("Continuing with in-memory stores");
            Stores::memory()
        }
    }
}

/// Drop idle router entries every `period`
pub fn spawn_cleanup(router: SessionRouter, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            let removed = router.cleanup_idle();
            tracing::debug!(
                "[Router] Cleaned up {} idle sessions, {} still open",
                removed,
                router.open_sessions()
            );
        }
    })
}
