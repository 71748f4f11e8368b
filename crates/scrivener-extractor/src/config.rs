//! Configuration for the Classifier and FieldExtractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by classification and field extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum document text sent to the model (characters)
    pub max_text_length: usize,

    /// Maximum time for a single model call (seconds)
    pub llm_timeout_secs: u64,

    /// Extra attempts after a transient transport failure
    pub transport_retries: u32,

    /// Pause before each retry (milliseconds)
    pub retry_backoff_ms: u64,

    /// Sampling temperature
    pub temperature: f32,
}

impl ExtractorConfig {
    /// Get the model call timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Get the retry backoff as a Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        if self.transport_retries > 5 {
            return Err("transport_retries cannot exceed 5".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            llm_timeout_secs: 60,
            transport_retries: 1,
            retry_backoff_ms: 1_000,
            temperature: scrivener_llm::DEFAULT_TEMPERATURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm_timeout(), Duration::from_secs(60));
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.llm_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("max_text_length = 1000").unwrap();
        assert_eq!(config.max_text_length, 1000);
        assert_eq!(config.transport_retries, 1);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig {
            retry_backoff_ms: 250,
            ..ExtractorConfig::default()
        };
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
