use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use quill_media::MediaError;

/// Request-level failure. Every handler returns this; the variant decides the
/// HTTP status and the client-visible reason.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input; nothing was written.
    #[error("{0}")]
    Validation(String),

    /// Missing or bad credentials.
    #[error("Invalid credentials")]
    Unauthorized,

    /// The authorization policy denied the action. Never downgraded to a
    /// silent no-op.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced id does not exist.
    #[error("Not found")]
    NotFound,

    /// Rejected media upload; carries the specific reason.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Storage or other unexpected failure. The transaction rolled back and
    /// the client sees a generic message; details go to the log only.
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn internal<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Internal(anyhow::Error::new(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::Media(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
