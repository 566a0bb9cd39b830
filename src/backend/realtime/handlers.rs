/**
 * Realtime HTTP Handlers
 *
 * - `GET /realtime/{session_id}/{user_id}` with a `Subscribe` header opens
 *   the participant's SSE stream
 * - `POST /realtime/{session_id}/document` publishes a document update
 * - `POST /realtime/{session_id}/sync` asks the peer for missing document
 *   operations
 * - `POST /realtime/{session_id}/chat` archives and delivers a chat message
 * - `POST /realtime/{session_id}/language` persists and announces a language
 *   change
 *
 * Each POST body is an `Envelope` of the matching kind.
 */
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    Json,
};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::realtime::relay::Relay;
use crate::backend::realtime::router::RouteError;
use crate::backend::realtime::subscription::sse_response;
use crate::shared::{Category, Envelope, SharedError};

/// Result of a publish
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Delivery {
    /// Receivers the envelope reached
    pub delivered: usize,
}

pub async fn handle_subscription(
    State(relay): State<Relay>,
    Path((session_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, BackendError> {
    if !headers.contains_key("subscribe") {
        tracing::warn!("[Realtime] Subscribe header missing");
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "Subscribe header required",
        ));
    }

    let subscription = relay.subscribe(&session_id, &user_id).await?;
    tracing::info!(
        "[Realtime] {} subscribed to {} (peer online: {})",
        user_id,
        session_id,
        subscription.peer_online
    );
    Ok(sse_response(subscription))
}

async fn publish(
    relay: Relay,
    path_session: String,
    envelope: Envelope,
    expected: Category,
) -> Result<(StatusCode, Json<Delivery>), BackendError> {
    if envelope.category() != expected {
        return Err(SharedError::validation(
            "kind",
            format!("expected a {} envelope", expected.as_str()),
        )
        .into());
    }
    if envelope.session_id() != path_session {
        return Err(RouteError::SessionMismatch {
            path: path_session,
            envelope: envelope.session_id().to_string(),
        }
        .into());
    }
    let delivered = relay.relay(envelope).await?;
    Ok((StatusCode::ACCEPTED, Json(Delivery { delivered })))
}

pub async fn post_document(
    State(relay): State<Relay>,
    Path(session_id): Path<String>,
    Json(envelope): Json<Envelope>,
) -> Result<(StatusCode, Json<Delivery>), BackendError> {
    publish(relay, session_id, envelope, Category::DocumentUpdate).await
}

pub async fn post_sync(
    State(relay): State<Relay>,
    Path(session_id): Path<String>,
    Json(envelope): Json<Envelope>,
) -> Result<(StatusCode, Json<Delivery>), BackendError> {
    publish(relay, session_id, envelope, Category::SyncRequest).await
}

pub async fn post_chat(
    State(relay): State<Relay>,
    Path(session_id): Path<String>,
    Json(envelope): Json<Envelope>,
) -> Result<(StatusCode, Json<Delivery>), BackendError> {
    publish(relay, session_id, envelope, Category::Chat).await
}

pub async fn post_language(
    State(relay): State<Relay>,
    Path(session_id): Path<String>,
    Json(envelope): Json<Envelope>,
) -> Result<(StatusCode, Json<Delivery>), BackendError> {
    publish(relay, session_id, envelope, Category::LanguageChange).await
}
