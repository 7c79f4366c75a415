use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every failure is scoped to the single request that triggered it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scoring disabled: {0}")]
    ScoringDisabled(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::ScoringDisabled(notice) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SCORING_DISABLED",
                notice.clone(),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                llm_status(e)
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

fn llm_status(e: &LlmError) -> (StatusCode, &'static str, String) {
    match e {
        LlmError::ProviderUnreachable { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "PROVIDER_UNREACHABLE",
            format!("AI scoring failed: {e}"),
        ),
        LlmError::ProviderError { .. } => (
            StatusCode::BAD_GATEWAY,
            "PROVIDER_ERROR",
            format!("AI scoring failed: {e}"),
        ),
        LlmError::MalformedResponse(_) => (
            StatusCode::BAD_GATEWAY,
            "MALFORMED_RESPONSE",
            "The model returned a response that could not be read as JSON".to_string(),
        ),
        LlmError::EmptyContent => (
            StatusCode::BAD_GATEWAY,
            "NO_CONTENT",
            "The model returned no content".to_string(),
        ),
        LlmError::ConfigurationMissing(notice) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SCORING_DISABLED",
            notice.clone(),
        ),
    }
}
