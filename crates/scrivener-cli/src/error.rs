//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: i32 = 2;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline could not start
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] scrivener_pipeline::PipelineError),

    /// Model client could not be built
    #[error("LLM error: {0}")]
    Llm(#[from] scrivener_llm::LlmError),

    /// Workbook could not be read
    #[error("Storage error: {0}")]
    Store(#[from] scrivener_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Toml(_) | CliError::InvalidInput(_) | CliError::Pipeline(_) => EXIT_CONFIG,
            _ => 1,
        }
    }
}
