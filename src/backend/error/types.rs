/**
 * Backend Error Types
 *
 * This module defines the error type returned by every HTTP handler. Lower
 * layers keep their own error enums (`StoreError`, `RouteError`,
 * `PickError`); they convert into `BackendError` with `?` and are mapped to
 * a status code here.
 *
 * # Status Mapping
 *
 * - not found (session, question, no matching question) - 404
 * - duplicate session id - 409
 * - validation and addressing violations - 400
 * - a user outside the session's pair - 403
 * - store and state failures - 500
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::questions::PickError;
use crate::backend::realtime::RouteError;
use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing headers, invalid request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// State management error (e.g., lock acquisition failure)
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Pick(#[from] PickError),

    /// Shared error (validation, serialization, snapshot)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// 404 with a message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
                StoreError::Database(_) | StoreError::Corrupt(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Route(err) => match err {
                RouteError::NotParticipant { .. } => StatusCode::FORBIDDEN,
                RouteError::SessionNotFound(_) => StatusCode::NOT_FOUND,
                RouteError::TwoPartyViolation { .. }
                | RouteError::WrongRecipient { .. }
                | RouteError::SessionMismatch { .. } => StatusCode::BAD_REQUEST,
                RouteError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Pick(err) => match err {
                PickError::Invalid(_) => StatusCode::BAD_REQUEST,
                PickError::NotFound => StatusCode::NOT_FOUND,
                PickError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SnapshotError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { message } => message.clone(),
            Self::Store(err) => err.to_string(),
            Self::Route(err) => err.to_string(),
            Self::Pick(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
