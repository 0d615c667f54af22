//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Failures raised by the scoring core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    /// Requested identifier is absent from the population store.
    #[error("Client {0} not found")]
    ClientNotFound(i64),

    /// Feature vector shape or order does not match the classifier schema.
    #[error("Feature vector does not match model schema: expected {expected}, got {actual}")]
    AttributionInputMismatch { expected: String, actual: String },

    /// An artifact could not be loaded at startup.
    #[error("Failed to load {artifact}: {reason}")]
    ArtifactLoadFailure { artifact: String, reason: String },
}

impl ScoringError {
    pub fn artifact(artifact: impl Into<String>, reason: impl ToString) -> Self {
        ScoringError::ArtifactLoadFailure {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        ScoringError::AttributionInputMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Validation errors
    ValidationError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::ClientNotFound(id) => {
                tracing::debug!("Client {} not found", id);
                AppError::NotFound("Client not found".to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
