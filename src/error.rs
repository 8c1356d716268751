use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

pub type ApiResult<T> = Result<T, ApiError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// StoreError
///
/// Failure reported by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// ApiError
///
/// Every failure a handler or the auth gate can produce. The `IntoResponse`
/// impl is the single place where failures become HTTP status codes and
/// `{ "message": ... }` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, tampered or expired credential.
    #[error("unauthorized access")]
    Unauthenticated,

    /// Valid credential, but the identity does not own the requested resource.
    #[error("Forbidden access")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Store(StoreError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Server-side causes stay in the logs, never in the response body.
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                "internal server error".to_string()
            }
            ApiError::Token(err) => {
                tracing::error!(error = %err, "token service failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
