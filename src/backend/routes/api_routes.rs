/**
 * API Route Handlers
 *
 * ## Sessions
 * - `POST /sessions`
 * - `GET|PATCH|DELETE /sessions/{id}`
 * - `GET /sessions/{id}/check`
 * - `GET /sessions/{id}/check/{user_id}`
 * - `GET /users/{user_id}/sessions`
 *
 * ## Chat archive
 * - `POST /sessions/{id}/chat`
 * - `GET /sessions/{id}/chat?page&limit`
 *
 * ## Questions
 * - `POST /questions`
 * - `GET /questions/random?complexity&category`
 * - `GET|DELETE /questions/{id}`
 */
use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::chat::handlers::{append_chat, get_chat_page};
use crate::backend::questions::handlers::{
    create_question, delete_question, get_question, pick_random_question,
};
use crate::backend::server::state::AppState;
use crate::backend::sessions::handlers::{
    check_participant, check_session, create_session, delete_session, get_session,
    list_user_sessions, patch_session,
};

/// Configure session, chat archive and question routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Session directory
        .route("/sessions", post(create_session))
        .route(
            "/sessions/{id}",
            get(get_session).patch(patch_session).delete(delete_session),
        )
        .route("/sessions/{id}/check", get(check_session))
        .route("/sessions/{id}/check/{user_id}", get(check_participant))
        .route("/users/{user_id}/sessions", get(list_user_sessions))
        // Chat archive
        .route("/sessions/{id}/chat", post(append_chat).get(get_chat_page))
        // Question bank
        .route("/questions", post(create_question))
        .route("/questions/random", get(pick_random_question))
        .route(
            "/questions/{id}",
            get(get_question).delete(delete_question),
        )
}
