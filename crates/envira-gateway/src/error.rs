//! HTTP error envelope for gateway handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use envira_core::ValidationErrors;
use envira_runtime::ProviderError;
use serde_json::json;

use crate::db::RepositoryError;
use crate::metrics;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error")]
    Validation(ValidationErrors),
    /// The body was neither JSON nor form fields.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("failed to store sensor data: {0}")]
    StoreFailed(RepositoryError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// The AI service answered, but not with a usable reply.
    #[error("AI provider failed: {0}")]
    AiFailed(ProviderError),
    /// The AI service could not be reached at all.
    #[error("AI provider unreachable: {0}")]
    AiUnreachable(ProviderError),
}

impl ApiError {
    /// Validation failure, counted per endpoint.
    pub fn rejected(endpoint: &str, errors: ValidationErrors) -> Self {
        metrics::VALIDATION_FAILURES
            .with_label_values(&[endpoint])
            .inc();
        Self::Validation(errors)
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Transport(_) => Self::AiUnreachable(error),
            other => Self::AiFailed(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "success": false, "message": "Validation error", "errors": errors }),
            ),
            ApiError::MalformedBody(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "success": false,
                    "message": "Validation error",
                    "errors": { "body": [reason] },
                }),
            ),
            ApiError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": "Invalid API key" }),
            ),
            ApiError::StoreFailed(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "message": "Failed to store sensor data",
                    "error": error.to_string(),
                }),
            ),
            ApiError::Repository(error) => {
                tracing::error!("repository error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": "Internal server error" }),
                )
            }
            ApiError::AiFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": "Failed to get response from AI model" }),
            ),
            ApiError::AiUnreachable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": "Unable to connect to AI service. Please ensure Ollama is running.",
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
