/**
 * Realtime Route Handlers
 *
 * - `GET /realtime/{session_id}/{user_id}` - SSE subscription (`Subscribe` header)
 * - `POST /realtime/{session_id}/document` - document update
 * - `POST /realtime/{session_id}/sync` - document sync request
 * - `POST /realtime/{session_id}/chat` - chat message
 * - `POST /realtime/{session_id}/language` - language change
 */
use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::realtime::handlers::{
    handle_subscription, post_chat, post_document, post_language, post_sync,
};
use crate::backend::server::state::AppState;

pub fn configure_realtime_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/realtime/{session_id}/document", post(post_document))
        .route("/realtime/{session_id}/sync", post(post_sync))
        .route("/realtime/{session_id}/chat", post(post_chat))
        .route("/realtime/{session_id}/language", post(post_language))
        .route("/realtime/{session_id}/{user_id}", get(handle_subscription))
}
