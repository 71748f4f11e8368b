//! Trait definitions for external interactions
//!
//! Implementations live in other crates: text extraction in
//! `scrivener-ingest`, model access in `scrivener-llm`.

use std::path::Path;

/// Turns a document file into plain text
///
/// Implemented by the ingest layer (scrivener-ingest) and by scripted
/// extractors in tests.
pub trait TextExtractor: Send + Sync {
    /// Error type for extraction failures; every error is per-file recoverable
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read `path` and return its preprocessed text
    fn extract_text(&self, path: &Path) -> Result<String, Self::Error>;

    /// Whether `path` has an extension this extractor handles
    fn supports(&self, path: &Path) -> bool;
}
