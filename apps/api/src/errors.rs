use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::generation::generator::GenerationError;
use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as `{"error": <message>}`, plus `"detail"` where one
/// is useful to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("No response from AI")]
    NoResponse,

    #[error("Invalid response from AI: {0}")]
    InvalidResponse(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::NoResponse => AppError::NoResponse,
            GenerationError::InvalidResponse(detail) => AppError::InvalidResponse(detail),
            GenerationError::MissingField(field) => {
                AppError::InvalidResponse(format!("missing required field '{field}'"))
            }
            GenerationError::NoSeeds(name) => {
                AppError::Validation(format!("thinker '{name}' has no seeds"))
            }
            GenerationError::Upstream(LlmError::RateLimited { message }) => {
                AppError::RateLimited(message)
            }
            GenerationError::Upstream(other) => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match &self {
            AppError::Configuration(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::RateLimited(msg) => {
                tracing::warn!("Generation rate limited: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limited by the generation service".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Generation service failed".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::NoResponse => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No response from AI".to_string(),
                None,
            ),
            AppError::InvalidResponse(detail) => {
                tracing::warn!("Invalid response from AI: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid response from AI".to_string(),
                    Some(detail.clone()),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Provocation store is unavailable or corrupt".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({ "error": message });
        if let (Some(detail), Value::Object(map)) = (detail, &mut body) {
            map.insert("detail".to_string(), Value::String(detail));
        }

        (status, Json(body)).into_response()
    }
}
