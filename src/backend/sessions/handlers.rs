/**
 * Session Directory HTTP Handlers
 *
 * - `POST /sessions` - create (409 on a duplicate id)
 * - `GET /sessions/{id}` - fetch
 * - `PATCH /sessions/{id}` - overwrite `language` and/or `document`
 * - `DELETE /sessions/{id}` - administrative delete
 * - `GET /sessions/{id}/check` - does the session exist
 * - `GET /sessions/{id}/check/{user_id}` - does it exist with this user in it
 * - `GET /users/{user_id}/sessions` - sessions a user participates in
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::store::Stores;
use crate::shared::{NewSession, Session, SessionPatch};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistsResponse {
    pub exists: bool,
}

fn session_not_found(session_id: &str) -> BackendError {
    BackendError::not_found(format!("session '{}' not found", session_id))
}

pub async fn create_session(
    State(stores): State<Stores>,
    Json(new_session): Json<NewSession>,
) -> Result<(StatusCode, Json<Session>), BackendError> {
    new_session.validate()?;
    let session = stores
        .sessions
        .create(new_session.into_session(Utc::now()))
        .await?;
    tracing::info!(
        "[Sessions] Created {} for {} and {}",
        session.id,
        session.participants.first(),
        session.participants.second()
    );
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(stores): State<Stores>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, BackendError> {
    stores
        .sessions
        .get(&session_id)
        .await?
        .map(Json)
        .ok_or_else(|| session_not_found(&session_id))
}

pub async fn patch_session(
    State(stores): State<Stores>,
    Path(session_id): Path<String>,
    Json(patch): Json<SessionPatch>,
) -> Result<Json<Session>, BackendError> {
    patch.validate()?;
    let session = stores.sessions.patch(&session_id, &patch).await?;
    tracing::debug!(
        "[Sessions] Patched {} (language: {}, document: {} bytes)",
        session_id,
        patch.language.is_some(),
        patch.document.as_ref().map_or(0, |d| d.len())
    );
    Ok(Json(session))
}

pub async fn delete_session(
    State(stores): State<Stores>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, BackendError> {
    if stores.sessions.delete(&session_id).await? {
        tracing::info!("[Sessions] Deleted {}", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&session_id))
    }
}

pub async fn check_session(
    State(stores): State<Stores>,
    Path(session_id): Path<String>,
) -> Result<Json<ExistsResponse>, BackendError> {
    let exists = stores.sessions.exists(&session_id).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn check_participant(
    State(stores): State<Stores>,
    Path((session_id, user_id)): Path<(String, String)>,
) -> Result<Json<ExistsResponse>, BackendError> {
    let exists = stores.sessions.has_participant(&session_id, &user_id).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn list_user_sessions(
    State(stores): State<Stores>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Session>>, BackendError> {
    Ok(Json(stores.sessions.list_for_user(&user_id).await?))
}
