//! Pipeline runner configuration.

use crate::core::AnalysisError;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`PipelineRunner`](super::PipelineRunner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How long computed results stay in the content cache.
    #[serde(with = "crate::core::result::duration_serde")]
    pub cache_ttl: Duration,

    /// Whether definitive fast-track evidence may end a run early.
    pub early_exit_enabled: bool,

    /// Metadata-forensics score that counts as definitive.
    pub definitive_threshold: f64,

    /// Coverage confidence reported for early-exit results.
    pub early_exit_confidence: f64,

    /// Maximum number of stages of one wave running at once.
    pub max_parallel_stages: usize,

    /// Largest artifact accepted, in bytes.
    pub max_artifact_size: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30 * 60),
            early_exit_enabled: true,
            definitive_threshold: 0.95,
            early_exit_confidence: 0.98,
            max_parallel_stages: 4,
            max_artifact_size: 100 * 1024 * 1024, // 100 MiB
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Enables or disables early exit.
    pub fn with_early_exit(mut self, enabled: bool) -> Self {
        self.early_exit_enabled = enabled;
        self
    }

    /// Sets the definitive-evidence threshold.
    pub fn with_definitive_threshold(mut self, threshold: f64) -> Self {
        self.definitive_threshold = threshold;
        self
    }

    /// Sets the confidence reported for early exits.
    pub fn with_early_exit_confidence(mut self, confidence: f64) -> Self {
        self.early_exit_confidence = confidence;
        self
    }

    /// Sets the per-wave concurrency limit.
    pub fn with_max_parallel_stages(mut self, max: usize) -> Self {
        self.max_parallel_stages = max;
        self
    }

    /// Sets the maximum artifact size.
    pub fn with_max_artifact_size(mut self, size: u64) -> Self {
        self.max_artifact_size = size;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_parallel_stages == 0 {
            return Err(AnalysisError::configuration(
                "max_parallel_stages must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.definitive_threshold) {
            return Err(AnalysisError::configuration(format!(
                "definitive_threshold must be within [0, 1], got {}",
                self.definitive_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.early_exit_confidence) {
            return Err(AnalysisError::configuration(format!(
                "early_exit_confidence must be within [0, 1], got {}",
                self.early_exit_confidence
            )));
        }
        if self.max_artifact_size == 0 {
            return Err(AnalysisError::configuration(
                "max_artifact_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert!(config.early_exit_enabled);
        assert_eq!(config.max_parallel_stages, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(PipelineConfig::new().with_max_parallel_stages(0).validate().is_err());
        assert!(PipelineConfig::new().with_definitive_threshold(1.5).validate().is_err());
        assert!(PipelineConfig::new().with_early_exit_confidence(-0.1).validate().is_err());
        assert!(PipelineConfig::new().with_max_artifact_size(0).validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "early_exit_enabled": false, "cache_ttl": 60000 }"#).unwrap();
        assert!(!config.early_exit_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.max_parallel_stages, 4);
    }
}
