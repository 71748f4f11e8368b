//! Scrivener LLM Provider Layer
//!
//! A single `complete(prompt) -> String` seam over chat-completion models.
//!
//! # Providers
//!
//! - `MockProvider`: scripted replies, injected failures and call counting for tests
//! - `OpenAiProvider`: any OpenAI-compatible `/chat/completions` endpoint
//!
//! # Examples
//!
//! ```
//! use scrivener_llm::{CompletionOptions, LlmProvider, MockProvider};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("PolicyDocument");
//! let reply = rt.block_on(provider.complete("classify this", &CompletionOptions::default())).unwrap();
//! assert_eq!(reply, "PolicyDocument");
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Credentials rejected (401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Network or API communication error, including 5xx responses
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available (404)
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

impl LlmError {
    /// Whether a single retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Timeout | LlmError::RateLimited | LlmError::Communication(_)
        )
    }

    /// Whether the error invalidates every further call of the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, LlmError::Auth(_))
    }
}

/// Per-call generation options
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Optional system message sent before the prompt
    pub system: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            system: None,
        }
    }
}

/// A chat-completion model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the reply text
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError> {
        (**self).complete(prompt, options).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[derive(Debug, Default)]
struct MockState {
    responses: Vec<(String, Result<String, LlmError>)>,
    queued_failures: VecDeque<LlmError>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen by the first registered key contained in the prompt,
/// falling back to the default response. Queued failures are returned, one
/// per call, before any reply.
///
/// # Examples
///
/// ```
/// use scrivener_llm::{CompletionOptions, LlmError, LlmProvider, MockProvider};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let provider = MockProvider::default();
/// provider.add_response("a.docx", "PolicyDocument");
/// provider.fail_next(LlmError::Timeout);
///
/// let opts = CompletionOptions::default();
/// assert_eq!(rt.block_on(provider.complete("a.docx", &opts)), Err(LlmError::Timeout));
/// assert_eq!(rt.block_on(provider.complete("a.docx", &opts)).unwrap(), "PolicyDocument");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reply with `response` to every prompt containing `key`
    pub fn add_response(&self, key: impl Into<String>, response: impl Into<String>) {
        self.state().responses.push((key.into(), Ok(response.into())));
    }

    /// Fail every prompt containing `key` with `error`
    pub fn add_error(&self, key: impl Into<String>, error: LlmError) {
        self.state().responses.push((key.into(), Err(error)));
    }

    /// Fail the next call, whatever its prompt
    pub fn fail_next(&self, error: LlmError) {
        self.state().queued_failures.push_back(error);
    }

    /// Number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String, LlmError> {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        if let Some(error) = state.queued_failures.pop_front() {
            return Err(error);
        }

        state
            .responses
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(self.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
