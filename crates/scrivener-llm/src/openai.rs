//! OpenAI-compatible provider
//!
//! Talks to any endpoint implementing `POST {base_url}/chat/completions`
//! with bearer authentication: the hosted OpenAI API, DeepSeek, Qwen,
//! vLLM, Ollama's compatibility layer, and so on.
//!
//! # Examples
//!
//! ```no_run
//! use scrivener_llm::OpenAiProvider;
//! use std::time::Duration;
//!
//! let provider = OpenAiProvider::new(
//!     "https://api.openai.com/v1",
//!     "sk-...",
//!     "gpt-4o-mini",
//!     Duration::from_secs(60),
//! ).unwrap();
//! ```

use crate::{CompletionOptions, LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider
    ///
    /// `timeout` bounds each HTTP request. Fails only if the HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Endpoint URL of chat completions
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Map a non-success HTTP status onto the error taxonomy
pub(crate) fn error_for_status(status: StatusCode, body: &str, model: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Auth(format!("HTTP {}: {}", status, snippet(body)))
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LlmError::Timeout,
        s if s.is_server_error() => LlmError::Communication(format!("HTTP {}: {}", status, snippet(body))),
        _ => LlmError::InvalidResponse(format!("HTTP {}: {}", status, snippet(body))),
    }
}

fn error_for_transport(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Pull the first choice's content out of a response body
pub(crate) fn parse_reply(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Sending chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(error_for_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(error_for_transport)?;

        if !status.is_success() {
            return Err(error_for_status(status, &text, &self.model));
        }

        let reply = parse_reply(&text)?;
        debug!(model = %self.model, reply_chars = reply.chars().count(), "Received chat completion");
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("http://localhost:8000/v1/", "key", "qwen", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8000/v1/chat/completions");
        assert_eq!(provider.model_name(), "qwen");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_for_status(StatusCode::UNAUTHORIZED, "", "m"), LlmError::Auth(_)));
        assert!(matches!(error_for_status(StatusCode::FORBIDDEN, "", "m"), LlmError::Auth(_)));
        assert_eq!(error_for_status(StatusCode::TOO_MANY_REQUESTS, "", "m"), LlmError::RateLimited);
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, "", "m"),
            LlmError::ModelNotAvailable("m".to_string())
        );
        assert!(matches!(
            error_for_status(StatusCode::BAD_GATEWAY, "upstream", "m"),
            LlmError::Communication(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "bad", "m"),
            LlmError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"PolicyDocument"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "PolicyDocument");
        assert!(matches!(parse_reply(r#"{"choices":[]}"#), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(parse_reply("not json"), Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_communication() {
        let provider = OpenAiProvider::new("http://127.0.0.1:1", "key", "m", Duration::from_secs(2)).unwrap();
        let result = provider.complete("test", &CompletionOptions::default()).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    // Requires OPENAI_API_KEY and network access
    #[tokio::test]
    #[ignore]
    async fn test_complete_integration() {
        let key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let provider = OpenAiProvider::new(DEFAULT_BASE_URL, key, "gpt-4o-mini", Duration::from_secs(30)).unwrap();
        let reply = provider
            .complete("Reply with the single word hello", &CompletionOptions::default())
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }
}
