use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Generation(e) => match e {
                GenerationError::Configuration(msg) => {
                    tracing::error!("Generation configuration error: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIG_ERROR",
                        "Email generation is not configured".to_string(),
                    )
                }
                GenerationError::Upstream(err) => {
                    tracing::error!("Upstream completion error: {err}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "The AI provider request failed".to_string(),
                    )
                }
                GenerationError::EmptyOrShortContent { .. }
                | GenerationError::IncompleteEmail { .. } => {
                    tracing::error!("{e}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "INCOMPLETE_CONTENT",
                        "AI returned incomplete content, please try again".to_string(),
                    )
                }
                GenerationError::DeadlineExceeded(limit) => {
                    tracing::error!("Generation timed out after {limit:?}");
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        "TIMEOUT",
                        "Email generation timed out, please try again".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
