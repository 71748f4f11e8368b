//! Document classification

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::llm_call::complete_with_retry;
use crate::parser::parse_category_reply;
use crate::prompt::{truncate, PromptSet};
use scrivener_domain::Category;
use scrivener_llm::{LlmError, LlmProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of classifying one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Assigned category
    pub category: Category,
    /// Why the category is Unknown, when it is
    pub rationale: Option<String>,
}

impl Classification {
    fn known(category: Category) -> Self {
        Self {
            category,
            rationale: None,
        }
    }

    fn unknown(rationale: impl Into<String>) -> Self {
        Self {
            category: Category::Unknown,
            rationale: Some(rationale.into()),
        }
    }
}

/// Assigns exactly one category to a document's text
pub struct Classifier<L: LlmProvider + ?Sized> {
    llm: Arc<L>,
    prompts: Arc<PromptSet>,
    config: ExtractorConfig,
}

impl<L: LlmProvider + ?Sized> Classifier<L> {
    /// Create a new Classifier
    pub fn new(llm: Arc<L>, prompts: Arc<PromptSet>, config: ExtractorConfig) -> Self {
        Self { llm, prompts, config }
    }

    /// Classify document text
    ///
    /// Every model problem except rejected credentials ends as `Unknown`
    /// with a rationale. `ExtractorError::Auth` is returned for rejected
    /// credentials because no later call can succeed either.
    pub async fn classify(&self, text: &str) -> Result<Classification, ExtractorError> {
        if text.trim().is_empty() {
            return Ok(Classification::unknown("document has no text"));
        }

        let content = truncate(text, self.config.max_text_length);
        let prompt = self.prompts.classification_prompt(&content);

        let reply = match complete_with_retry(self.llm.as_ref(), &prompt, &self.config).await {
            Ok(reply) => reply,
            Err(LlmError::Auth(message)) => return Err(ExtractorError::Auth(message)),
            Err(e) => {
                warn!(error = %e, "Classification call failed");
                return Ok(Classification::unknown(format!("model call failed: {}", e)));
            }
        };

        match parse_category_reply(&reply) {
            Some(Category::Unknown) => Ok(Classification::unknown("model replied Unknown")),
            Some(category) => {
                info!(%category, "Classified document");
                Ok(Classification::known(category))
            }
            None => {
                let snippet: String = reply.trim().chars().take(200).collect();
                warn!(reply = %snippet, "Unrecognised classification reply");
                Ok(Classification::unknown(format!("unrecognised reply: {}", snippet)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_llm::MockProvider;

    fn classifier(llm: &MockProvider) -> Classifier<MockProvider> {
        let config = ExtractorConfig {
            retry_backoff_ms: 0,
            ..ExtractorConfig::default()
        };
        Classifier::new(Arc::new(llm.clone()), Arc::new(PromptSet::default()), config)
    }

    #[tokio::test]
    async fn test_label_reply() {
        let llm = MockProvider::new(" policydocument \n");
        let result = classifier(&llm).classify("关于促进经济发展的若干政策").await.unwrap();
        assert_eq!(result, Classification::known(Category::PolicyDocument));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unrecognised_reply_is_unknown() {
        let llm = MockProvider::new("I think this is a policy document.");
        let result = classifier(&llm).classify("text").await.unwrap();
        assert_eq!(result.category, Category::Unknown);
        assert!(result.rationale.unwrap().contains("I think"));
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let llm = MockProvider::new("PolicyDocument");
        let result = classifier(&llm).classify("  \n").await.unwrap();
        assert_eq!(result.category, Category::Unknown);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_in_prompt() {
        let llm = MockProvider::new("MeetingMaterial");
        let config = ExtractorConfig {
            max_text_length: 10,
            ..ExtractorConfig::default()
        };
        let classifier = Classifier::new(Arc::new(llm.clone()), Arc::new(PromptSet::default()), config);
        let text = format!("{}{}", "会".repeat(10), "议".repeat(100));
        classifier.classify(&text).await.unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains(&"会".repeat(10)));
        assert!(!prompt.contains('议'));
        assert!(prompt.contains(crate::prompt::TRUNCATION_MARKER.trim()));
    }

    #[tokio::test]
    async fn test_auth_failure_is_an_error() {
        let llm = MockProvider::new("PolicyDocument");
        llm.fail_next(LlmError::Auth("401".into()));
        let result = classifier(&llm).classify("text").await;
        assert_eq!(result, Err(ExtractorError::Auth("401".into())));
    }
}
