//! Scrivener Extractor
//!
//! Turns document text into a category and a validated field set using a
//! language model.
//!
//! # Architecture
//!
//! ```text
//! Document → Classifier → Category ─┬─ Unknown → (skipped)
//!                                   └─ known → FieldExtractor → ExtractionRecord
//! ```
//!
//! Model replies are parsed once, at this boundary, into tagged results:
//! [`Classification`] and [`Extraction`]. Every model call is bounded by a
//! timeout and transient transport failures are retried once.
//!
//! # Example Usage
//!
//! ```no_run
//! use scrivener_domain::{Document, SchemaRegistry, SourceId};
//! use scrivener_extractor::{Classifier, Extraction, ExtractorConfig, FieldExtractor, PromptSet};
//! use scrivener_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockProvider::new("PolicyDocument"));
//! let prompts = Arc::new(PromptSet::default());
//! let config = ExtractorConfig::default();
//!
//! let classifier = Classifier::new(llm.clone(), prompts.clone(), config.clone());
//! let extractor = FieldExtractor::new(llm, Arc::new(SchemaRegistry::builtin()), prompts, config);
//!
//! let doc = Document::new("a.docx".into(), SourceId::new("a.docx"), "text".into(), 4, None);
//! let classification = classifier.classify(&doc.text).await?;
//! if let Extraction::Record(record) = extractor.extract(&doc, classification.category).await? {
//!     println!("{} fields", record.fields().len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;
mod error;
mod fields;
mod llm_call;
mod parser;
mod prompt;
mod values;

#[cfg(test)]
mod tests;

pub use classifier::{Classification, Classifier};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use fields::{Extraction, ExtractionFailure, FieldExtractor};
pub use parser::parse_category_reply;
pub use prompt::{truncate, PromptSet, TRUNCATION_MARKER};
pub use values::{parse_date, parse_number};
