use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::{
    google::VerificationError, jwt::InvalidTokenError, password::HashingError, repo::StoreError,
};

/// Failure of an auth flow, mapped one-to-one onto an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Authentication(String),
    #[error("store operation timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AuthError::Timeout | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AuthError::Internal("unexpected missing user".into()),
            StoreError::Duplicate => AuthError::Conflict("user already exists".into()),
            StoreError::Timeout => AuthError::Timeout,
            StoreError::Database(e) => AuthError::Internal(e.to_string()),
        }
    }
}

impl From<HashingError> for AuthError {
    fn from(e: HashingError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<InvalidTokenError> for AuthError {
    fn from(_: InvalidTokenError) -> Self {
        AuthError::Authentication("invalid or expired token".into())
    }
}

impl From<VerificationError> for AuthError {
    fn from(_: VerificationError) -> Self {
        AuthError::Authentication("invalid external token".into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Timeout | AuthError::Internal(_) => {
                error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
