//! Hosted models via the OpenAI chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{post_json, LlmError, ModelProvider, ModelRequest, RawModelResponse, ResponseFormat};
use crate::config::ProviderKind;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonObjectFormat>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonObjectFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

pub struct OpenAiProvider {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(http: Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        }
    }

    fn build_body<'a>(&'a self, request: &'a ModelRequest) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: [
                CompletionMessage {
                    role: "system",
                    content: &request.system,
                },
                CompletionMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: match request.format {
                ResponseFormat::Structured => Some(JsonObjectFormat {
                    format_type: "json_object",
                }),
                ResponseFormat::Freeform => None,
            },
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, request: &ModelRequest) -> Result<RawModelResponse, LlmError> {
        let body = self.build_body(request);

        let response: CompletionResponse = post_json(
            &self.http,
            &self.endpoint,
            Some(&self.api_key),
            &body,
            request.timeout,
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse("completion has no choices".to_string()))?
            .message
            .content;

        Ok(RawModelResponse::from_content(content))
    }
}
