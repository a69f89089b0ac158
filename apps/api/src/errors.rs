use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::prompts::PromptError;
use crate::llm_client::LlmError;
use crate::render::RenderError;
use crate::storage::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Invalid profile name: {0:?}")]
    InvalidProfileName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    MissingContextKey(String),

    #[error("AI did not return a valid HTML document. Response: {snippet}")]
    InvalidGenerationOutput { snippet: String },

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("PDF rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidProfileName(name) => AppError::InvalidProfileName(name),
            other => AppError::Storage(other),
        }
    }
}

impl From<PromptError> for AppError {
    fn from(e: PromptError) -> Self {
        AppError::MissingContextKey(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Not logged in".to_string(),
            ),
            AppError::IncorrectPassword => (
                StatusCode::UNAUTHORIZED,
                "INCORRECT_PASSWORD",
                "Incorrect password.".to_string(),
            ),
            AppError::InvalidProfileName(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROFILE_NAME",
                self.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingContextKey(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_CONTEXT_KEY",
                msg.clone(),
            ),
            AppError::InvalidGenerationOutput { .. } => {
                tracing::warn!("{self}");
                (StatusCode::BAD_GATEWAY, "INVALID_GENERATION_OUTPUT", self.to_string())
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("Error generating AI resume: {e}"),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    format!("Could not produce PDF: {e}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
