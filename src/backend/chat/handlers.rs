/**
 * Chat Archive HTTP Handlers
 *
 * - `POST /sessions/{id}/chat` - archive a message without routing it
 * - `GET /sessions/{id}/chat?page=1&limit=10` - one page of history
 *
 * Live chat goes through `POST /realtime/{id}/chat`, which archives and
 * routes in one step.
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::backend::chat::archive::{ChatArchive, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::backend::error::BackendError;
use crate::shared::{ChatMessage, ChatPage, SharedError};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn append_chat(
    State(archive): State<ChatArchive>,
    Path(session_id): Path<String>,
    Json(message): Json<ChatMessage>,
) -> Result<StatusCode, BackendError> {
    if message.session_id != session_id {
        return Err(SharedError::validation(
            "session_id",
            "message session does not match the path",
        )
        .into());
    }
    archive.append(message).await?;
    Ok(StatusCode::CREATED)
}

pub async fn get_chat_page(
    State(archive): State<ChatArchive>,
    Path(session_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ChatPage>, BackendError> {
    let page = archive
        .page(
            &session_id,
            query.page.unwrap_or(DEFAULT_PAGE),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}
