use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Imports must be attributed to a user; ownerless records are never inserted.
    #[error("Missing actor identity")]
    MissingActor,

    /// The duplicate lookup failed. Retryable; the import was not started.
    #[error("Duplicate check failed: {0}")]
    DuplicateCheck(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::MissingActor => (
                StatusCode::UNAUTHORIZED,
                "MISSING_ACTOR",
                "An acting user is required to import prospects".to_string(),
            ),
            AppError::DuplicateCheck(msg) => {
                tracing::warn!("Duplicate check failed: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "DUPLICATE_CHECK_FAILED",
                    "Unable to verify duplicates, please try again".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": matches!(self, AppError::DuplicateCheck(_)),
            }
        }));

        (status, body).into_response()
    }
}
