//! Chat completion client implementation

use std::time::Duration;

use async_trait::async_trait;

use crate::config::OpenAiConfig;
use crate::models::{ChatRequest, ChatResponse};
use crate::{OpenAiError, Result};

/// A chat completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model requests should name.
    fn model(&self) -> &str;

    /// Run one chat completion.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client for the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(300)) // 5 min timeout for completions
            .build()
            .map_err(|e| OpenAiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        self.config.model()
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url());

        tracing::debug!(model = %request.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let chat_response: ChatResponse = response.json().await?;
            if let Some(usage) = &chat_response.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "Chat completion finished"
                );
            }
            Ok(chat_response)
        } else if status == 429 {
            Err(OpenAiError::RateLimited)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(OpenAiError::ServerError(format!(
                "Chat completion failed: {} - {}",
                status,
                Self::error_message(&body)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig::new("sk-test").with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 2000
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    serde_json::json!({
                        "id": "chatcmpl-123",
                        "object": "chat.completion",
                        "created": 1677652288,
                        "model": "gpt-4o-mini",
                        "choices": [{
                            "index": 0,
                            "message": {
                                "role": "assistant",
                                "content": "TITLE: Release plan\n## Overview"
                            },
                            "finish_reason": "stop"
                        }],
                        "usage": {
                            "prompt_tokens": 9,
                            "completion_tokens": 12,
                            "total_tokens": 21
                        }
                    })
                    .to_string(),
                    "application/json",
                ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = ChatRequest::new(client.model(), vec![ChatMessage::user("Hello!")])
            .with_max_tokens(2000);
        let response = client
            .chat_completion(&request)
            .await
            .expect("chat completion");
        assert_eq!(response.content(), Some("TITLE: Release plan\n## Overview"));
    }

    #[tokio::test]
    async fn test_chat_completion_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hello!")]);
        let result = client_for(&server).chat_completion(&request).await;
        let err = result.unwrap_err();
        assert!(matches!(err, OpenAiError::ServerError(_)));
        assert!(err.to_string().contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_chat_completion_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hello!")]);
        let result = client_for(&server).chat_completion(&request).await;
        assert!(matches!(result, Err(OpenAiError::RateLimited)));
    }

    #[test]
    fn test_base_url() {
        let client = OpenAiClient::new(OpenAiConfig::new("k")).unwrap();
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
        assert_eq!(client.model(), "gpt-4o-mini");

        let client =
            OpenAiClient::new(OpenAiConfig::new("k").with_base_url("http://localhost:1234/v1/"))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
    }
}
