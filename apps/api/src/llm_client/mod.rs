//! LLM Client — the single point of entry for all model calls in the copilot.
//!
//! ARCHITECTURAL RULE: No other module may call a model provider directly.
//! Scoring and charter generation both go through `ModelClient`, which talks to
//! one `ModelProvider` (local Ollama or hosted OpenAI) chosen at startup.
//!
//! One attempt per call. Failures surface immediately; there is no retry loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::charter::CharterFields;
use crate::config::{Config, ProviderKind};

pub mod ollama;
pub mod openai;
pub mod prompts;

use ollama::OllamaProvider;
use openai::OpenAiProvider;

/// Longest slice of a provider body quoted back in an error message.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Could not reach model provider at {endpoint}: {cause}")]
    ProviderUnreachable { endpoint: String, cause: String },

    #[error("Model provider at {endpoint} returned status {status}: {message}")]
    ProviderError {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Scoring disabled: {0}")]
    ConfigurationMissing(String),

    #[error("Model returned no content")]
    EmptyContent,
}

/// Output shape requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// JSON object output (Ollama `format: "json"`, OpenAI `json_object`).
    Structured,
    /// Plain text / markdown.
    Freeform,
}

/// Provider-neutral request: system instruction, user prompt, desired format.
/// The model identifier is owned by the provider.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub prompt: String,
    pub format: ResponseFormat,
    pub timeout: Duration,
}

/// Untrusted content returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum RawModelResponse {
    Text(String),
    Structured(Value),
}

impl RawModelResponse {
    /// Wraps a provider `content` field. Strings stay text; missing or null content
    /// becomes empty text; any other JSON value is already structured.
    pub fn from_content(content: Option<Value>) -> Self {
        match content {
            None | Some(Value::Null) => RawModelResponse::Text(String::new()),
            Some(Value::String(text)) => RawModelResponse::Text(text),
            Some(other) => RawModelResponse::Structured(other),
        }
    }
}

/// A model backend. Implementations own their endpoint, credentials, and wire format.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;
    fn model(&self) -> &str;
    fn endpoint(&self) -> &str;
    async fn complete(&self, request: &ModelRequest) -> Result<RawModelResponse, LlmError>;
}

/// The single model client used by all services.
/// Builds the scoring and charter payloads and delegates transport to the provider.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ModelProvider>,
    score_timeout: Duration,
    charter_timeout: Duration,
}

impl ModelClient {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        score_timeout: Duration,
        charter_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            score_timeout,
            charter_timeout,
        }
    }

    /// Selects and builds the configured provider.
    /// A cloud provider without credentials yields `ConfigurationMissing`.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let http = Client::builder()
            .build()
            .map_err(|e| {
                LlmError::ConfigurationMissing(format!("HTTP client unavailable: {e}"))
            })?;

        let provider: Arc<dyn ModelProvider> = match config.provider {
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(
                http,
                &config.ollama_url,
                config.ollama_model.clone(),
            )),
            ProviderKind::OpenAi => {
                let api_key = config.openai_api_key.clone().ok_or_else(|| {
                    LlmError::ConfigurationMissing(
                        "Set OPENAI_API_KEY in your environment to enable AI scoring.".to_string(),
                    )
                })?;
                Arc::new(OpenAiProvider::new(
                    http,
                    &config.openai_base_url,
                    api_key,
                    config.openai_model.clone(),
                ))
            }
        };

        Ok(Self::new(provider, config.score_timeout, config.charter_timeout))
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Asks the model for the six sub-scores, rationale, lenses and recommended priority.
    pub async fn request_scoring(
        &self,
        description: &str,
        systems: &str,
    ) -> Result<RawModelResponse, LlmError> {
        let request = ModelRequest {
            system: prompts::SCORE_SYSTEM.to_string(),
            prompt: prompts::build_score_prompt(description, systems),
            format: ResponseFormat::Structured,
            timeout: self.score_timeout,
        };
        self.send(&request).await
    }

    /// Asks the model for a markdown project charter.
    pub async fn request_charter(
        &self,
        fields: &CharterFields,
    ) -> Result<RawModelResponse, LlmError> {
        let request = ModelRequest {
            system: prompts::CHARTER_SYSTEM.to_string(),
            prompt: prompts::build_charter_prompt(fields),
            format: ResponseFormat::Freeform,
            timeout: self.charter_timeout,
        };
        self.send(&request).await
    }

    async fn send(&self, request: &ModelRequest) -> Result<RawModelResponse, LlmError> {
        debug!(
            "LLM call: provider={}, model={}, format={:?}, timeout={}s",
            self.provider.kind().as_str(),
            self.provider.model(),
            request.format,
            request.timeout.as_secs()
        );

        let result = self.provider.complete(request).await;
        if let Err(e) = &result {
            warn!("LLM call to {} failed: {e}", self.provider.endpoint());
        }
        result
    }
}

/// Provider error bodies: OpenAI nests `{"error": {"message"}}`, Ollama uses `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderErrorDetail {
    Message { message: String },
    Text(String),
}

/// Sends one JSON POST and decodes the provider envelope.
/// Transport failures (connect, timeout) → `ProviderUnreachable`; non-2xx → `ProviderError`;
/// an undecodable envelope → `MalformedResponse`.
pub(crate) async fn post_json<B, T>(
    http: &Client,
    endpoint: &str,
    bearer: Option<&str>,
    body: &B,
    timeout: Duration,
) -> Result<T, LlmError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut builder = http.post(endpoint).timeout(timeout).json(body);
    if let Some(token) = bearer {
        builder = builder.bearer_auth(token);
    }

    let transport_error = |e: reqwest::Error| LlmError::ProviderUnreachable {
        endpoint: endpoint.to_string(),
        cause: if e.is_timeout() {
            format!("timed out after {}s", timeout.as_secs())
        } else {
            e.to_string()
        },
    };

    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .map(|e| match e.error {
                ProviderErrorDetail::Message { message } => message,
                ProviderErrorDetail::Text(text) => text,
            })
            .unwrap_or_else(|_| truncate(&body, ERROR_BODY_LIMIT));
        return Err(LlmError::ProviderError {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        LlmError::MalformedResponse(format!("unexpected envelope from {endpoint}: {e}"))
    })
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
