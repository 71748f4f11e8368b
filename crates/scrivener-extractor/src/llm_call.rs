//! Bounded, retried model calls

use crate::config::ExtractorConfig;
use scrivener_llm::{CompletionOptions, LlmError, LlmProvider};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Call the model once, retrying transient failures
///
/// Each attempt is bounded by `llm_timeout`; an elapsed attempt counts as
/// `LlmError::Timeout`. Transient failures are retried up to
/// `transport_retries` times after `retry_backoff`. Anything else is
/// returned immediately.
pub(crate) async fn complete_with_retry<L>(
    llm: &L,
    prompt: &str,
    config: &ExtractorConfig,
) -> Result<String, LlmError>
where
    L: LlmProvider + ?Sized,
{
    let options = CompletionOptions {
        temperature: config.temperature,
        system: None,
    };

    let mut attempt = 0;
    loop {
        debug!(attempt, prompt_chars = prompt.chars().count(), "Calling model");
        let result = match timeout(config.llm_timeout(), llm.complete(prompt, &options)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        };

        match result {
            Ok(reply) => {
                debug!(reply_chars = reply.chars().count(), "Model replied");
                return Ok(reply);
            }
            Err(e) if e.is_transient() && attempt < config.transport_retries => {
                attempt += 1;
                warn!(error = %e, attempt, "Transient model failure, retrying");
                sleep(config.retry_backoff()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_llm::MockProvider;

    fn fast() -> ExtractorConfig {
        ExtractorConfig {
            retry_backoff_ms: 0,
            ..ExtractorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_one_transient_failure_is_retried() {
        let llm = MockProvider::new("ok");
        llm.fail_next(LlmError::RateLimited);
        assert_eq!(complete_with_retry(&llm, "p", &fast()).await.unwrap(), "ok");
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let llm = MockProvider::new("ok");
        llm.fail_next(LlmError::Timeout);
        llm.fail_next(LlmError::Communication("reset".into()));
        let result = complete_with_retry(&llm, "p", &fast()).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_auth_is_not_retried() {
        let llm = MockProvider::new("ok");
        llm.fail_next(LlmError::Auth("401".into()));
        let result = complete_with_retry(&llm, "p", &fast()).await;
        assert!(matches!(result, Err(LlmError::Auth(_))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries() {
        let llm = MockProvider::new("ok");
        llm.fail_next(LlmError::Timeout);
        let config = ExtractorConfig {
            transport_retries: 0,
            ..fast()
        };
        assert_eq!(complete_with_retry(&llm, "p", &config).await, Err(LlmError::Timeout));
        assert_eq!(llm.call_count(), 1);
    }
}
