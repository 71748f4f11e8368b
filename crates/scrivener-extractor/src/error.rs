//! Error types for the Extractor
//!
//! Per-document problems are values (`Classification`, `Extraction`); only
//! conditions that should stop the caller are errors.

use scrivener_domain::Category;
use thiserror::Error;

/// Errors that can occur during classification or extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Model credentials rejected; fatal to the run
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Category has no schema
    #[error("Unsupported category: {0}")]
    UnsupportedCategory(Category),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
