//! Schema-driven field extraction

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::llm_call::complete_with_retry;
use crate::parser::{extract_json_object, value_to_text};
use crate::prompt::{truncate, PromptSet};
use crate::values::normalize;
use scrivener_domain::{Category, Document, ExtractionRecord, SchemaRegistry};
use scrivener_llm::{LlmError, LlmProvider};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a document produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Reply held no usable JSON object
    Unparsable(String),
    /// Every required field was absent from the reply
    NoRequiredFields,
    /// Model call failed after retries
    Transport(String),
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionFailure::Unparsable(detail) => write!(f, "unparsable reply: {}", detail),
            ExtractionFailure::NoRequiredFields => write!(f, "reply contains none of the required fields"),
            ExtractionFailure::Transport(detail) => write!(f, "model call failed: {}", detail),
        }
    }
}

/// Outcome of extracting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Fields extracted; individual values may carry flags
    Record(ExtractionRecord),
    /// No record could be produced
    Failed(ExtractionFailure),
}

/// Extracts a category's schema fields from document text
pub struct FieldExtractor<L: LlmProvider + ?Sized> {
    llm: Arc<L>,
    registry: Arc<SchemaRegistry>,
    prompts: Arc<PromptSet>,
    config: ExtractorConfig,
}

impl<L: LlmProvider + ?Sized> FieldExtractor<L> {
    /// Create a new FieldExtractor
    pub fn new(
        llm: Arc<L>,
        registry: Arc<SchemaRegistry>,
        prompts: Arc<PromptSet>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            prompts,
            config,
        }
    }

    /// Extract the fields of `category` from `document`
    ///
    /// The record always has exactly the schema's fields in schema order.
    pub async fn extract(&self, document: &Document, category: Category) -> Result<Extraction, ExtractorError> {
        let schema = self
            .registry
            .schema_for(category)
            .ok_or(ExtractorError::UnsupportedCategory(category))?;

        let content = truncate(&document.text, self.config.max_text_length);
        let prompt = self.prompts.extraction_prompt(schema, &content);

        let reply = match complete_with_retry(self.llm.as_ref(), &prompt, &self.config).await {
            Ok(reply) => reply,
            Err(LlmError::Auth(message)) => return Err(ExtractorError::Auth(message)),
            Err(e) => {
                warn!(source = %document.source, error = %e, "Extraction call failed");
                return Ok(Extraction::Failed(ExtractionFailure::Transport(e.to_string())));
            }
        };

        let object = match extract_json_object(&reply) {
            Ok(object) => object,
            Err(detail) => {
                warn!(source = %document.source, %detail, "Unparsable extraction reply");
                return Ok(Extraction::Failed(ExtractionFailure::Unparsable(detail)));
            }
        };

        let required: Vec<&str> = schema.required_model_fields().map(|f| f.name.as_str()).collect();
        let present = |name: &str| object.get(name).and_then(value_to_text).is_some();
        if !required.is_empty() && !required.iter().any(|name| present(*name)) {
            warn!(source = %document.source, %category, "Reply has none of the required fields");
            return Ok(Extraction::Failed(ExtractionFailure::NoRequiredFields));
        }

        let ignored: Vec<&String> = object.keys().filter(|k| schema.field(k).is_none()).collect();
        if !ignored.is_empty() {
            debug!(source = %document.source, ?ignored, "Ignoring undeclared reply keys");
        }

        let record = ExtractionRecord::from_schema(document.source.clone(), schema, |spec| {
            let raw = object.get(&spec.name).and_then(value_to_text);
            normalize(spec, raw.as_deref(), &document.source)
        });

        let flagged = record.flagged_fields();
        if flagged.is_empty() {
            info!(source = %document.source, %category, "Extracted fields");
        } else {
            warn!(source = %document.source, %category, ?flagged, "Extracted fields with validation flags");
        }
        Ok(Extraction::Record(record))
    }
}
