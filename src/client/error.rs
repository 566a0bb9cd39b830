//! Client error types

use thiserror::Error;

use crate::shared::SharedError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the response body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Operation timed out")]
    Timeout,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Transport is not connected")]
    NotConnected,

    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Failure reported by an in-process backend
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

#[cfg(feature = "ssr")]
impl From<crate::backend::BackendError> for ClientError {
    fn from(err: crate::backend::BackendError) -> Self {
        let status = err.status_code().as_u16();
        match status {
            400..=499 => ClientError::Status {
                status,
                message: err.message(),
            },
            _ => ClientError::Backend(err.to_string()),
        }
    }
}
