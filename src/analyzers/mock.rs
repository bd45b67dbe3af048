//! Mock analyzer for testing.
//!
//! This module provides a configurable analyzer that can be used in tests
//! and demos to simulate stage outputs, latency and failures without running
//! a real detector.

use crate::core::{Analyzer, Artifact, ContentHasher, StageError, StageOutput};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A mock analyzer for testing purposes.
///
/// The mock can return a fixed output for every artifact, or specific
/// outputs for specific content fingerprints.
///
/// # Examples
///
/// ```rust
/// use evidencefuse::analyzers::MockAnalyzer;
/// use serde_json::json;
/// use std::time::Duration;
///
/// // Reports the same color score for everything
/// let color = MockAnalyzer::new("color-balance", json!({ "ai_color_score": 0.7 }));
///
/// // Always fails
/// let broken = MockAnalyzer::failing("ai-model", "weights not loaded");
///
/// // Slow, and only accepts files on disk
/// let slow = MockAnalyzer::new("exif", json!({}))
///     .with_latency(Duration::from_millis(100))
///     .path_only();
/// ```
#[derive(Debug)]
pub struct MockAnalyzer {
    /// Stage name this analyzer serves.
    name: String,
    /// Outputs keyed by content fingerprint (BLAKE3 hex).
    responses: HashMap<String, StageOutput>,
    /// Output for artifacts not in the response map.
    default_output: StageOutput,
    /// Simulated latency.
    latency: Option<Duration>,
    /// Error message returned on failure.
    failure: Option<String>,
    /// Probability of failure (0.0 to 1.0).
    fail_rate: f32,
    /// Counter for analyze calls.
    call_count: AtomicU64,
    /// Whether in-memory artifacts are accepted.
    supports_bytes: bool,
}

impl MockAnalyzer {
    /// Creates a mock that returns `output` for every artifact.
    pub fn new(name: impl Into<String>, output: StageOutput) -> Self {
        Self {
            name: name.into(),
            responses: HashMap::new(),
            default_output: output,
            latency: None,
            failure: None,
            fail_rate: 0.0,
            call_count: AtomicU64::new(0),
            supports_bytes: true,
        }
    }

    /// Creates a mock that always fails with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            fail_rate: 1.0,
            ..Self::new(name, Value::Null)
        }
    }

    /// Sets the output for artifacts not in the response map.
    pub fn with_default_output(mut self, output: StageOutput) -> Self {
        self.default_output = output;
        self
    }

    /// Adds an output for a specific content fingerprint (hex digest).
    pub fn with_response(mut self, fingerprint: impl Into<String>, output: StageOutput) -> Self {
        self.responses.insert(fingerprint.into(), output);
        self
    }

    /// Sets the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Sets the probability of failure.
    pub fn with_fail_rate(mut self, rate: f32) -> Self {
        self.fail_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Rejects in-memory artifacts.
    pub fn path_only(mut self) -> Self {
        self.supports_bytes = false;
        self
    }

    /// Returns the number of analyze calls.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn should_fail(&self, call: u64) -> bool {
        if self.fail_rate <= 0.0 {
            return false;
        }
        if self.fail_rate >= 1.0 {
            return true;
        }
        // Deterministic spread over the call sequence
        (call as f32 * 0.618_034) % 1.0 < self.fail_rate
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.should_fail(call) {
            let message = self.failure.as_deref().unwrap_or("simulated failure");
            return Err(StageError::failed(&self.name, message));
        }

        if self.responses.is_empty() {
            return Ok(self.default_output.clone());
        }

        let fingerprint = ContentHasher::new()
            .hash_artifact(artifact)
            .await
            .map_err(|e| StageError::failed(&self.name, e.to_string()))?;

        Ok(self
            .responses
            .get(fingerprint.as_str())
            .cloned()
            .unwrap_or_else(|| self.default_output.clone()))
    }

    fn supports_bytes(&self) -> bool {
        self.supports_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_fixed_output() {
        let analyzer = MockAnalyzer::new("lighting-analysis", json!({"ai_probability": 0.4}));
        let artifact = Artifact::from_bytes(b"test data".to_vec());

        let output = analyzer.analyze(&artifact).await.unwrap();
        assert_eq!(output["ai_probability"], 0.4);
        assert_eq!(analyzer.call_count(), 1);
        assert!(analyzer.supports_bytes());
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let analyzer = MockAnalyzer::failing("ai-model", "weights not loaded");
        let artifact = Artifact::from_bytes(b"x".to_vec());

        let err = analyzer.analyze(&artifact).await.unwrap_err();
        assert_eq!(err.stage(), Some("ai-model"));
        assert!(err.to_string().contains("weights not loaded"));
    }

    #[tokio::test]
    async fn test_mock_response_by_fingerprint() {
        let known = ContentHasher::new().hash_bytes(b"known image");
        let analyzer = MockAnalyzer::new("c2pa", json!({"score": 0}))
            .with_response(known.as_str(), json!({"score": 99, "score_confidence": 1.0}));

        let hit = analyzer
            .analyze(&Artifact::from_bytes(b"known image".to_vec()))
            .await
            .unwrap();
        assert_eq!(hit["score"], 99);

        let miss = analyzer
            .analyze(&Artifact::from_bytes(b"other image".to_vec()))
            .await
            .unwrap();
        assert_eq!(miss["score"], 0);
    }

    #[tokio::test]
    async fn test_mock_fail_rate_is_partial() {
        let analyzer = MockAnalyzer::new("exif", json!({})).with_fail_rate(0.5);
        let artifact = Artifact::from_bytes(b"x".to_vec());

        let mut failures = 0;
        for _ in 0..20 {
            if analyzer.analyze(&artifact).await.is_err() {
                failures += 1;
            }
        }
        assert!(failures > 0 && failures < 20);
    }
}
