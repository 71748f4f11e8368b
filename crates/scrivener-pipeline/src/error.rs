//! Error types for pipeline runs

use scrivener_ingest::IngestError;
use thiserror::Error;

/// Errors that stop a run before any file is processed
///
/// Per-file problems are never errors here; they become
/// [`FileOutcome`](scrivener_domain::FileOutcome)s.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input directory could not be scanned
    #[error("Input error: {0}")]
    Input(#[from] IngestError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
