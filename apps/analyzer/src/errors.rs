use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::feedback::sink::SinkError;
use crate::ingest::extractor::DecodeError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not read document: {0}")]
    Decode(#[from] DecodeError),

    #[error("Too many requests, retry after {}s", retry_after_secs(.retry_after))]
    TooManyRequests { retry_after: Duration },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Feedback storage error: {0}")]
    Storage(#[from] SinkError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Whole seconds the client should wait, rounded up so a client that waits
/// exactly this long is never rejected again.
pub fn retry_after_secs(retry_after: &Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Decode(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_DOCUMENT",
                format!("Could not extract text from the document: {e}. Please upload it again."),
            ),
            AppError::TooManyRequests { retry_after } => {
                let secs = retry_after_secs(retry_after);
                let body = Json(json!({
                    "error": {
                        "code": "COOLDOWN",
                        "message": format!("Please wait {secs} seconds before sending more feedback"),
                        "retry_after_secs": secs
                    }
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The AI service could not complete this request".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Feedback storage error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_ERROR",
                    "Feedback could not be saved".to_string(),
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
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
