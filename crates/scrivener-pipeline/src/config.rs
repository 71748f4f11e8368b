//! Configuration for pipeline runs

use serde::{Deserialize, Serialize};

/// Upper bound on concurrent files
pub const MAX_WORKERS: usize = 32;

/// How the orchestrator walks and schedules the input
///
/// # Examples
///
/// ```
/// use scrivener_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.workers, 1);
/// assert!(!config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files processed concurrently; 1 keeps strict discovery order end to end
    pub workers: usize,

    /// Descend into subdirectories of the input directory
    pub recursive: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            recursive: false,
        }
    }
}

impl PipelineConfig {
    /// Check the worker count is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(format!("workers must be between 1 and {}, got {}", MAX_WORKERS, self.workers));
        }
        Ok(())
    }
}
