/**
 * Router Configuration
 *
 * Combines all route groups into one Axum router:
 * 1. realtime routes (SSE subscription, envelope publishing)
 * 2. API routes (sessions, chat archive, questions)
 * 3. health check
 * 4. JSON 404 fallback
 *
 * Every request passes through a `TraceLayer`; CORS is permissive so a
 * browser editor served from another origin can subscribe.
 */
use axum::{routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::error::conversion::not_found_fallback;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::realtime_routes::configure_realtime_routes;
use crate::backend::server::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();
    let router = configure_realtime_routes(router);
    let router = configure_api_routes(router);

    router
        .route("/health", get(health))
        .fallback(not_found_fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}
