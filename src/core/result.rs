//! Pipeline result structures.
//!
//! A [`PipelineResult`] is the raw evidence of one invocation: what each
//! stage returned, which stages ran, and how the run ended. Turning it into
//! a decision is the aggregator's job.

use crate::core::types::Fingerprint;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Opaque, analyzer-specific output of one stage.
pub type StageOutput = serde_json::Value;

/// The complete result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Unique identifier of the run that computed this result.
    pub id: String,

    /// Content fingerprint of the analyzed artifact.
    pub fingerprint: Fingerprint,

    /// Output of every stage that completed, keyed by stage name.
    pub results_by_stage: BTreeMap<String, StageOutput>,

    /// Stages that produced a result, in execution order.
    pub stages_run: Vec<String>,

    /// Number of stages the runner tried, successful or not.
    pub stages_attempted: usize,

    /// Whether definitive fast-track evidence ended the run early.
    pub early_exit: bool,

    /// Whether this value was served from the content cache.
    pub cache_hit: bool,

    /// Coverage confidence in [0, 1]. Measures how much of the pipeline
    /// completed, not how certain the verdict is.
    pub confidence: f64,

    /// Compute time for a miss, lookup latency for a cache hit.
    #[serde(with = "duration_serde")]
    pub process_time: Duration,

    /// When the underlying analysis finished.
    pub completed_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Returns the output of a stage, if it completed.
    pub fn result(&self, stage: &str) -> Option<&StageOutput> {
        self.results_by_stage.get(stage)
    }

    /// Returns `true` if the stage produced a result.
    pub fn has_stage(&self, stage: &str) -> bool {
        self.results_by_stage.contains_key(stage)
    }

    /// Number of stages that produced a result.
    pub fn completed_count(&self) -> usize {
        self.stages_run.len()
    }

    /// Iterates completed stages with their output, in execution order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (&str, &StageOutput)> {
        self.stages_run.iter().filter_map(|name| {
            self.results_by_stage
                .get(name)
                .map(|output| (name.as_str(), output))
        })
    }

    /// Compares two results while ignoring `cache_hit` and `process_time`.
    ///
    /// A cache hit and the miss that populated it are equal under this
    /// comparison.
    pub fn same_analysis(&self, other: &Self) -> bool {
        self.id == other.id
            && self.fingerprint == other.fingerprint
            && self.results_by_stage == other.results_by_stage
            && self.stages_run == other.stages_run
            && self.stages_attempted == other.stages_attempted
            && self.early_exit == other.early_exit
            && self.confidence == other.confidence
            && self.completed_at == other.completed_at
    }

    /// Returns a copy marked as served from cache with the given latency.
    pub fn as_cache_hit(&self, lookup_latency: Duration) -> Self {
        Self {
            cache_hit: true,
            process_time: lookup_latency,
            ..self.clone()
        }
    }
}

/// Serde helper for Duration serialization.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PipelineResult {
        let mut results = BTreeMap::new();
        results.insert("c2pa".to_string(), json!({"score": 0}));
        results.insert("exif".to_string(), json!({"has_camera_info": true}));
        PipelineResult {
            id: "run-1".into(),
            fingerprint: Fingerprint::from_hex("ab".repeat(32)),
            results_by_stage: results,
            stages_run: vec!["exif".into(), "c2pa".into()],
            stages_attempted: 3,
            early_exit: false,
            cache_hit: false,
            confidence: 0.7,
            process_time: Duration::from_millis(420),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_iter_in_order_follows_stages_run() {
        let result = sample();
        let names: Vec<&str> = result.iter_in_order().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["exif", "c2pa"]);
        assert!(result.has_stage("c2pa"));
        assert!(!result.has_stage("ai-model"));
        assert_eq!(result.completed_count(), 2);
    }

    #[test]
    fn test_cache_hit_copy_is_same_analysis() {
        let original = sample();
        let hit = original.as_cache_hit(Duration::from_micros(30));
        assert!(hit.cache_hit);
        assert_eq!(hit.process_time, Duration::from_micros(30));
        assert!(hit.same_analysis(&original));
        assert_ne!(hit, original);
    }

    #[test]
    fn test_serializes_process_time_as_millis() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["process_time"], json!(420));
        assert_eq!(value["stages_run"], json!(["exif", "c2pa"]));
    }
}
