//! Per-method scoring: extraction, categorization, calibration.

use crate::core::{MethodCategory, PipelineResult, StageKind};
use crate::extract::{ConfidenceExtractor, Signal};
use crate::verdict::config::ScoringConfig;

use serde::{Deserialize, Serialize};

/// One method's contribution to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Stage name.
    pub stage: String,
    /// Extracted reading.
    pub raw: Signal,
    /// Evidence family of the stage.
    pub category: MethodCategory,
    /// Raw score after calibration; `None` without a signal.
    pub calibrated: Option<f64>,
    /// Effective weight, adaptive multiplier included; `None` until weighted
    /// or without a signal.
    pub weight: Option<f64>,
}

impl ScoreRecord {
    /// Returns `true` if this method takes part in scoring.
    pub fn is_scored(&self) -> bool {
        self.raw.is_signal()
    }

    /// The calibrated score of a scored method.
    pub fn score(&self) -> Option<f64> {
        self.calibrated
    }
}

/// Extracts and categorizes every completed stage, in execution order.
///
/// Stages without a signal are kept, so the caller can report them, but
/// never receive a calibrated score.
pub fn extract_scores(result: &PipelineResult, extractor: &ConfidenceExtractor) -> Vec<ScoreRecord> {
    result
        .iter_in_order()
        .map(|(stage, output)| ScoreRecord {
            stage: stage.to_string(),
            raw: extractor.extract(stage, output),
            category: StageKind::from_name(stage).category(),
            calibrated: None,
            weight: None,
        })
        .collect()
}

/// Applies the per-method calibration factor, clamped to [0, 1].
pub fn calibrate(method: &str, raw: f64, config: &ScoringConfig) -> f64 {
    (raw * config.calibration_for(method)).clamp(0.0, 1.0)
}

/// Calibrates every scored record in place.
pub fn calibrate_all(records: &mut [ScoreRecord], config: &ScoringConfig) {
    for record in records.iter_mut() {
        record.calibrated = record
            .raw
            .score()
            .map(|raw| calibrate(&record.stage, raw, config));
    }
}

/// Returns the first metadata-forensics record whose raw score is
/// definitive on its own.
pub fn find_definitive<'a>(records: &'a [ScoreRecord], config: &ScoringConfig) -> Option<&'a ScoreRecord> {
    records.iter().find(|r| {
        r.category == MethodCategory::MetadataForensics
            && r.raw.score().is_some_and(|s| s >= config.definitive_threshold)
    })
}

/// Mean raw score of one category, `None` when it has no scored method.
pub fn category_mean(records: &[ScoreRecord], category: MethodCategory) -> Option<f64> {
    let scores: Vec<f64> = records
        .iter()
        .filter(|r| r.category == category)
        .filter_map(|r| r.raw.score())
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
