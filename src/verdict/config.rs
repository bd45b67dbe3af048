//! The versioned scoring table.
//!
//! Every numeric constant the aggregator uses lives here, so a retuned
//! table is a data change. Tables load from JSON; missing fields fall back
//! to the shipped defaults.

use crate::core::ScoringConfigError;
use crate::verdict::label::VerdictLabel;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Lower bound of one verdict band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Smallest final score mapped to `label`.
    pub lower: f64,
    /// Label of the band.
    pub label: VerdictLabel,
}

impl Threshold {
    /// Creates a band starting at `lower`.
    pub fn new(lower: f64, label: VerdictLabel) -> Self {
        Self { lower, label }
    }
}

/// Adaptive weight multipliers for decisive scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveWeighting {
    /// Scores at or above this count as decisively synthetic.
    pub high_score: f64,
    /// Weight multiplier for decisively synthetic scores.
    pub high_multiplier: f64,
    /// Scores at or below this count as decisively authentic.
    pub low_score: f64,
    /// Weight multiplier for decisively authentic scores.
    pub low_multiplier: f64,
}

impl Default for AdaptiveWeighting {
    fn default() -> Self {
        Self {
            high_score: 0.8,
            high_multiplier: 1.2,
            low_score: 0.2,
            low_multiplier: 1.3,
        }
    }
}

/// Cross-method corroboration factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// A computer-vision score at or above this agrees on generation.
    pub cv_positive: f64,
    /// A computer-vision score at or below this agrees on authenticity.
    pub cv_negative: f64,
    /// Factor when three or more computer-vision methods agree.
    pub strong_agreement: f64,
    /// Factor when exactly two computer-vision methods agree.
    pub pair_agreement: f64,
    /// A model score at or above this counts as a positive prediction.
    pub model_positive: f64,
    /// A model score at or below this counts as a negative prediction.
    pub model_negative: f64,
    /// Factor when a positive model prediction has computer-vision support.
    pub model_corroborated: f64,
    /// Factor when the model and two or more computer-vision methods agree
    /// on authenticity.
    pub model_authentic: f64,
    /// Lower clamp of the combined factor.
    pub min: f64,
    /// Upper clamp of the combined factor.
    pub max: f64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            cv_positive: 0.6,
            cv_negative: 0.3,
            strong_agreement: 1.4,
            pair_agreement: 1.2,
            model_positive: 0.5,
            model_negative: 0.3,
            model_corroborated: 1.3,
            model_authentic: 0.6,
            min: 0.4,
            max: 2.0,
        }
    }
}

/// Coverage-based sharpening and softening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Coverage at or above this sharpens the score.
    pub high_coverage: f64,
    /// Coverage below this softens the score.
    pub low_coverage: f64,
    /// Relative push away from 0.5 at high coverage.
    pub sharpen: f64,
    /// Relative pull towards 0.5 at low coverage.
    pub soften: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            high_coverage: 0.8,
            low_coverage: 0.5,
            sharpen: 0.05,
            soften: 0.05,
        }
    }
}

/// Confidence estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Scores at or above this are strong positives.
    pub strong_high: f64,
    /// Scores at or below this are strong negatives.
    pub strong_low: f64,
    /// Weight of the strong-band fraction.
    pub strong_weight: f64,
    /// Weight of the agreement term.
    pub agreement_weight: f64,
    /// Variance multiplier; agreement is `1 - variance * scale`.
    pub variance_scale: f64,
    /// Bonus when a corroboration rule fired.
    pub corroboration_bonus: f64,
    /// Minimum confidence of a scored verdict.
    pub floor: f64,
    /// Maximum confidence of a scored verdict.
    pub ceiling: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            strong_high: 0.7,
            strong_low: 0.3,
            strong_weight: 0.6,
            agreement_weight: 0.4,
            variance_scale: 4.0,
            corroboration_bonus: 0.1,
            floor: 0.3,
            ceiling: 0.99,
        }
    }
}

/// All constants of the verdict computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Table version, reported on every verdict.
    pub version: u32,
    /// Per-method calibration factors.
    pub calibration: BTreeMap<String, f64>,
    /// Factor for methods missing from `calibration`.
    pub default_calibration: f64,
    /// Per-method weights.
    pub weights: BTreeMap<String, f64>,
    /// Weight for methods missing from `weights`.
    pub default_weight: f64,
    /// Metadata-forensics score that decides the verdict on its own.
    pub definitive_threshold: f64,
    /// Confidence of a definitive verdict.
    pub definitive_confidence: f64,
    /// Adaptive weight multipliers.
    pub adaptive: AdaptiveWeighting,
    /// Corroboration factors.
    pub boost: BoostConfig,
    /// Coverage adjustment.
    pub quality: QualityConfig,
    /// Ascending verdict bands.
    pub thresholds: Vec<Threshold>,
    /// Fewer scored methods than this shift the bands up.
    pub min_methods: usize,
    /// Shift applied to every band above the first.
    pub sparse_shift: f64,
    /// Confidence parameters.
    pub confidence: ConfidenceConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let calibration = [
            ("lighting-analysis", 1.30),
            ("artifacts", 1.05),
            ("advanced-artifacts", 0.95),
            ("pixel-analysis", 0.80),
            ("color-balance", 1.20),
            ("object-coherence", 1.10),
            ("compression", 0.20),
            ("metadata", 1.15),
            ("c2pa", 0.90),
            ("exif", 0.70),
            ("ai-model", 1.25),
            ("metadata-quick", 1.08),
        ];
        let weights = [
            ("ai-model", 6.0),
            ("compression", 4.0),
            ("lighting-analysis", 3.5),
            ("artifacts", 3.0),
            ("advanced-artifacts", 3.0),
            ("color-balance", 3.0),
            ("metadata", 2.5),
            ("pixel-analysis", 2.5),
            ("c2pa", 2.0),
            ("exif", 1.0),
            ("metadata-quick", 0.8),
            ("object-coherence", 0.5),
        ];

        Self {
            version: 1,
            calibration: calibration
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            default_calibration: 1.0,
            weights: weights.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            default_weight: 1.0,
            definitive_threshold: 0.95,
            definitive_confidence: 0.95,
            adaptive: AdaptiveWeighting::default(),
            boost: BoostConfig::default(),
            quality: QualityConfig::default(),
            thresholds: vec![
                Threshold::new(0.0, VerdictLabel::VeryLikelyAuthentic),
                Threshold::new(0.20, VerdictLabel::LikelyAuthentic),
                Threshold::new(0.40, VerdictLabel::PossiblyAiGenerated),
                Threshold::new(0.60, VerdictLabel::LikelyAiGenerated),
                Threshold::new(0.75, VerdictLabel::VeryLikelyAiGenerated),
            ],
            min_methods: 4,
            sparse_shift: 0.05,
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Creates the shipped default table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON table.
    pub fn from_json_str(json: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON table file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScoringConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes the table as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ScoringConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets one method's calibration factor.
    pub fn with_calibration(mut self, method: impl Into<String>, factor: f64) -> Self {
        self.calibration.insert(method.into(), factor);
        self
    }

    /// Sets one method's weight.
    pub fn with_weight(mut self, method: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(method.into(), weight);
        self
    }

    /// Replaces the verdict bands.
    pub fn with_thresholds(mut self, thresholds: Vec<Threshold>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Calibration factor of a method.
    pub fn calibration_for(&self, method: &str) -> f64 {
        self.calibration
            .get(method)
            .copied()
            .unwrap_or(self.default_calibration)
    }

    /// Weight of a method.
    pub fn weight_for(&self, method: &str) -> f64 {
        self.weights
            .get(method)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Checks the table for values the aggregator cannot work with.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let invalid = |reason: String| ScoringConfigError::Invalid {
            version: self.version,
            reason,
        };

        if self.version == 0 {
            return Err(invalid("version must be greater than zero".into()));
        }

        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(invalid(format!("{name} must be a finite non-negative number, got {value}")))
            }
        };
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(invalid(format!("{name} must be within [0, 1], got {value}")))
            }
        };

        for (method, factor) in &self.calibration {
            non_negative(&format!("calibration factor of '{method}'"), *factor)?;
        }
        for (method, weight) in &self.weights {
            non_negative(&format!("weight of '{method}'"), *weight)?;
        }
        non_negative("default_calibration", self.default_calibration)?;
        non_negative("default_weight", self.default_weight)?;
        non_negative("adaptive.high_multiplier", self.adaptive.high_multiplier)?;
        non_negative("adaptive.low_multiplier", self.adaptive.low_multiplier)?;
        unit("definitive_threshold", self.definitive_threshold)?;
        unit("definitive_confidence", self.definitive_confidence)?;
        unit("quality.sharpen", self.quality.sharpen)?;
        unit("quality.soften", self.quality.soften)?;
        unit("sparse_shift", self.sparse_shift)?;
        unit("confidence.floor", self.confidence.floor)?;
        unit("confidence.ceiling", self.confidence.ceiling)?;

        let b = &self.boost;
        for (name, factor) in [
            ("boost.strong_agreement", b.strong_agreement),
            ("boost.pair_agreement", b.pair_agreement),
            ("boost.model_corroborated", b.model_corroborated),
            ("boost.model_authentic", b.model_authentic),
            ("boost.min", b.min),
            ("boost.max", b.max),
        ] {
            non_negative(name, factor)?;
        }
        if b.min > b.max {
            return Err(invalid(format!(
                "boost bounds are inverted: min {} > max {}",
                b.min, b.max
            )));
        }
        if b.min == 0.0 {
            return Err(invalid("boost.min must be greater than zero".into()));
        }

        if self.confidence.floor > self.confidence.ceiling {
            return Err(invalid(format!(
                "confidence floor {} exceeds ceiling {}",
                self.confidence.floor, self.confidence.ceiling
            )));
        }

        let Some(first) = self.thresholds.first() else {
            return Err(invalid("at least one verdict threshold is required".into()));
        };
        if first.lower != 0.0 {
            return Err(invalid(format!(
                "the first threshold must start at 0.0, got {}",
                first.lower
            )));
        }
        for t in &self.thresholds {
            unit("threshold lower bound", t.lower)?;
            if t.label == VerdictLabel::InsufficientEvidence {
                return Err(invalid(
                    "insufficient_evidence cannot be a threshold label".into(),
                ));
            }
        }
        for pair in self.thresholds.windows(2) {
            if pair[1].lower <= pair[0].lower {
                return Err(invalid(format!(
                    "thresholds must be strictly ascending: {} follows {}",
                    pair[1].lower, pair[0].lower
                )));
            }
            if pair[1].label <= pair[0].label {
                return Err(invalid(format!(
                    "threshold labels must ascend: {} follows {}",
                    pair[1].label.as_str(),
                    pair[0].label.as_str()
                )));
            }
        }

        Ok(())
    }
}
