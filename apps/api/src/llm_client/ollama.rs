//! Local inference via the Ollama chat API (`POST /api/chat`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{post_json, LlmError, ModelProvider, ModelRequest, RawModelResponse, ResponseFormat};
use crate::config::ProviderKind;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<Value>,
}

pub struct OllamaProvider {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(http: Client, base_url: &str, model: String) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model,
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, request: &ModelRequest) -> Result<RawModelResponse, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            format: match request.format {
                ResponseFormat::Structured => Some("json"),
                ResponseFormat::Freeform => None,
            },
            stream: false,
        };

        let response: ChatResponse =
            post_json(&self.http, &self.endpoint, None, &body, request.timeout).await?;

        Ok(RawModelResponse::from_content(
            response.message.and_then(|m| m.content),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    use super::*;

    type Captured = Arc<Mutex<Vec<Value>>>;

    /// Serves `/api/chat` with a fixed status and body, capturing request payloads.
    async fn spawn_stub(status: StatusCode, reply: Value) -> (SocketAddr, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/chat",
                post(
                    move |State(seen): State<Captured>, Json(payload): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            seen.lock().unwrap().push(payload);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, captured)
    }

    fn request(format: ResponseFormat, timeout: Duration) -> ModelRequest {
        ModelRequest {
            system: "sys".to_string(),
            prompt: "user prompt".to_string(),
            format,
            timeout,
        }
    }

    fn provider_at(base_url: &str) -> OllamaProvider {
        OllamaProvider::new(Client::new(), base_url, "llama3.1".to_string())
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            provider_at("http://localhost:11434/").endpoint(),
            "http://localhost:11434/api/chat"
        );
    }

    #[tokio::test]
    async fn test_structured_request_sets_json_format_and_returns_content() {
        let (addr, captured) = spawn_stub(
            StatusCode::OK,
            json!({"message": {"role": "assistant", "content": "{\"bi\": 4}"}}),
        )
        .await;
        let provider = provider_at(&format!("http://{addr}"));

        let raw = provider
            .complete(&request(ResponseFormat::Structured, Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(raw, RawModelResponse::Text("{\"bi\": 4}".to_string()));
        let sent = captured.lock().unwrap();
        assert_eq!(sent[0]["model"], "llama3.1");
        assert_eq!(sent[0]["format"], "json");
        assert_eq!(sent[0]["stream"], false);
        assert_eq!(sent[0]["messages"][0]["role"], "system");
        assert_eq!(sent[0]["messages"][1]["content"], "user prompt");
    }

    #[tokio::test]
    async fn test_freeform_request_omits_format() {
        let (addr, captured) = spawn_stub(
            StatusCode::OK,
            json!({"message": {"content": "# Project Charter"}}),
        )
        .await;
        let provider = provider_at(&format!("http://{addr}"));

        provider
            .complete(&request(ResponseFormat::Freeform, Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(captured.lock().unwrap()[0].get("format").is_none());
    }

    #[tokio::test]
    async fn test_object_content_is_structured() {
        let (addr, _) = spawn_stub(StatusCode::OK, json!({"message": {"content": {"bi": 2}}})).await;
        let provider = provider_at(&format!("http://{addr}"));

        let raw = provider
            .complete(&request(ResponseFormat::Structured, Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(raw, RawModelResponse::Structured(json!({"bi": 2})));
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let (addr, _) = spawn_stub(
            StatusCode::NOT_FOUND,
            json!({"error": "model 'llama3.1' not found"}),
        )
        .await;
        let provider = provider_at(&format!("http://{addr}"));

        let err = provider
            .complete(&request(ResponseFormat::Structured, Duration::from_secs(5)))
            .await
            .unwrap_err();

        match err {
            LlmError::ProviderError {
                endpoint,
                status,
                message,
            } => {
                assert_eq!(status, 404);
                assert!(endpoint.ends_with("/api/chat"));
                assert!(message.contains("not found"));
            }
            other => panic!("expected ProviderError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_provider_unreachable() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let provider = provider_at(&format!("http://{addr}"));

        let err = provider
            .complete(&request(
                ResponseFormat::Structured,
                Duration::from_millis(200),
            ))
            .await
            .unwrap_err();

        assert!(
            matches!(err, LlmError::ProviderUnreachable { .. }),
            "expected ProviderUnreachable, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_provider_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let provider = provider_at(&format!("http://{addr}"));

        let err = provider
            .complete(&request(ResponseFormat::Structured, Duration::from_secs(5)))
            .await
            .unwrap_err();

        match err {
            LlmError::ProviderUnreachable { endpoint, .. } => {
                assert_eq!(endpoint, format!("http://{addr}/api/chat"));
            }
            other => panic!("expected ProviderUnreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_malformed() {
        let app = Router::new().route("/api/chat", post(|| async { "not json at all" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let provider = provider_at(&format!("http://{addr}"));

        let err = provider
            .complete(&request(ResponseFormat::Structured, Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }
}
