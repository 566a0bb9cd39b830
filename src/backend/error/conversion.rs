/**
 * Error Conversion
 *
 * Backend errors implement `IntoResponse`, so handlers can return them
 * directly. The body is JSON:
 *
 * ```json
 * {
 *   "error": "session 'abc123' not found",
 *   "status": 404
 * }
 * ```
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Error] {} - {}", status.as_u16(), message);
        } else {
            tracing::debug!("[Error] {} - {}", status.as_u16(), message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Body returned by the fallback handler
pub async fn not_found_fallback() -> Response {
    BackendError::handler(StatusCode::NOT_FOUND, "404 Not Found").into_response()
}
