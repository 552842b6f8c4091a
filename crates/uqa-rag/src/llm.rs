//! LLM Client implementation
//!
//! Chat-completion client for the Together AI API, which speaks the
//! OpenAI-compatible `/chat/completions` protocol. One non-streaming
//! request is made per call.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uqa_core::{ChatMessage, LlmClient, LlmConfig, Result, UqaError};

/// Together AI chat-completion client
pub struct TogetherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl TogetherClient {
    /// Create a new client against the public Together endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: LlmConfig::default().base_url,
            model: model.into(),
            timeout: None,
        }
    }

    /// Create from config
    ///
    /// A missing API key is accepted here; calls will fail until one is set.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
        }
    }

    /// Set custom base URL (for proxies or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl LlmClient for TogetherClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UqaError::LlmError("Together API key not configured".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UqaError::LlmError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(UqaError::LlmError(format!(
                "Together error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| UqaError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| UqaError::LlmError("No response generated".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Option<(Option<String>, Value)>>>;

    fn completion_stub(reply: Value, captured: Captured) -> Router {
        Router::new()
            .route(
                "/chat/completions",
                post(
                    |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        *captured.lock().unwrap() = Some((auth, body));
                        Json(reply)
                    },
                ),
            )
            .with_state(captured)
    }

    #[test]
    fn test_together_client_creation() {
        let client = TogetherClient::new("test-key", "deepseek-ai/DeepSeek-R1");
        assert_eq!(client.model(), "deepseek-ai/DeepSeek-R1");
        assert_eq!(client.base_url, "https://api.together.xyz/v1");
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:9999/v1/".to_string(),
            ..Default::default()
        };
        let client = TogetherClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:9999/v1");
        assert_eq!(client.timeout, Some(Duration::from_secs(60)));
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn test_chat_sends_messages_and_returns_top_choice() {
        let captured: Captured = Arc::default();
        let base = spawn_stub(completion_stub(
            json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "Правильный ответ 3"}, "finish_reason": "stop"},
                    {"message": {"role": "assistant", "content": "ignored 5"}, "finish_reason": "stop"}
                ]
            }),
            captured.clone(),
        ))
        .await;

        let client = TogetherClient::new("secret", "test-model").with_base_url(base);
        let text = client
            .chat(&[ChatMessage::system("sys"), ChatMessage::user("q")])
            .await
            .unwrap();
        assert_eq!(text, "Правильный ответ 3");

        let (auth, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "q");
        assert!(body.get("stream").is_none());
    }

    #[tokio::test]
    async fn test_chat_empty_choices_is_error() {
        let base = spawn_stub(completion_stub(json!({"choices": []}), Arc::default())).await;
        let client = TogetherClient::new("k", "m").with_base_url(base);

        let err = client.chat(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(matches!(err, UqaError::LlmError(_)));
    }

    #[tokio::test]
    async fn test_chat_error_status() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_stub(router).await;
        let client = TogetherClient::new("k", "m").with_base_url(base);

        let err = client.chat(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_chat_without_api_key_fails_lazily() {
        let client = TogetherClient::from_config(&LlmConfig::default());
        let err = client.chat(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_chat_times_out() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"choices": []}))
            }),
        );
        let base = spawn_stub(router).await;
        let client = TogetherClient::new("k", "m")
            .with_base_url(base)
            .with_timeout(Duration::from_millis(100));

        let err = client.chat(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(matches!(err, UqaError::LlmError(_)));
    }
}
