use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{credentials::CredentialError, models::ErrorBody, repository::RepoError};

/// AppError
///
/// Every failure a handler can produce. Implements `IntoResponse` so handlers can
/// return `AppResult<T>` and use `?`; the body is always `{"error": message}`.
///
/// | Variant | Status |
/// |---|---|
/// | `Validation` | 400 |
/// | `Unauthenticated` | 401 (admin routes included, no 403) |
/// | `Repository(NotFound)` | 404 |
/// | `Repository(DuplicateEmail)` | 409 |
/// | `Repository(AlreadyReviewed)` | 400 |
/// | `Repository(Storage)`, `Credential`, `Internal` | 500, message sanitized |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Repository(err) => match err {
                RepoError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
                RepoError::NotFound { entity, .. } => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found"))
                }
                RepoError::DuplicateEmail => (StatusCode::CONFLICT, err.to_string()),
                RepoError::AlreadyReviewed(_) => (
                    StatusCode::BAD_REQUEST,
                    "Article has already been reviewed".to_string(),
                ),
                RepoError::Storage(e) => {
                    tracing::error!("storage failure: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            AppError::Credential(e) => {
                tracing::error!("credential failure: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorBody { error })).into_response()
    }
}
