//! The verdict aggregator.

use crate::core::{MethodCategory, PipelineResult, ScoringConfigError};
use crate::extract::ConfidenceExtractor;
use crate::pipeline::MetricsRecorder;
use crate::verdict::config::ScoringConfig;
use crate::verdict::fusion::{self, Boost};
use crate::verdict::label::VerdictLabel;
use crate::verdict::mapping;
use crate::verdict::reasoning;
use crate::verdict::score::{self, ScoreRecord};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Mean raw score of one evidence family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The family.
    pub category: MethodCategory,
    /// Mean raw score; `None` when no method of the family scored.
    pub mean: Option<f64>,
    /// Number of scored methods.
    pub methods: usize,
}

/// How closely computer-vision evidence and the trained model agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    /// Means differ by at most 0.1.
    StrongAgreement,
    /// Means differ by at most 0.3.
    ModerateAgreement,
    /// Means differ by at most 0.5.
    WeakAgreement,
    /// Means differ by more than 0.5.
    StrongDisagreement,
    /// One of the two families has no score.
    InsufficientData,
}

impl AgreementLevel {
    /// Classifies the gap between two category means.
    pub fn between(cv: Option<f64>, model: Option<f64>) -> Self {
        let (Some(cv), Some(model)) = (cv, model) else {
            return Self::InsufficientData;
        };
        let diff = (cv - model).abs();
        if diff <= 0.1 {
            Self::StrongAgreement
        } else if diff <= 0.3 {
            Self::ModerateAgreement
        } else if diff <= 0.5 {
            Self::WeakAgreement
        } else {
            Self::StrongDisagreement
        }
    }
}

/// The decision for one pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Discrete label.
    pub label: VerdictLabel,
    /// Final score as a percentage; `None` for insufficient evidence.
    pub probability_percent: Option<f64>,
    /// Confidence in the label, in [0, 1].
    pub confidence: f64,
    /// One statement per contributing method.
    pub reasoning: Vec<String>,
    /// Every completed stage with its extracted and calibrated score.
    pub scores: Vec<ScoreRecord>,
    /// Applied consistency boost factor.
    pub boost: f64,
    /// Fraction of attempted stages that produced a score.
    pub coverage: f64,
    /// Per-family means.
    pub categories: Vec<CategorySummary>,
    /// Agreement between computer vision and the trained model.
    pub agreement: AgreementLevel,
    /// Stage whose evidence decided the verdict on its own.
    pub definitive_stage: Option<String>,
    /// Version of the scoring table used.
    pub config_version: u32,
    /// When the verdict was computed.
    pub created_at: DateTime<Utc>,
}

impl Verdict {
    /// Returns `true` if no analyzer produced a usable signal.
    pub fn is_insufficient(&self) -> bool {
        self.label == VerdictLabel::InsufficientEvidence
    }

    /// Number of methods that contributed a score.
    pub fn scored_methods(&self) -> usize {
        self.scores.iter().filter(|r| r.is_scored()).count()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        match self.probability_percent {
            Some(p) => format!(
                "{} - {:.0} AI points with {:.0}% confidence",
                self.label,
                p,
                self.confidence * 100.0
            ),
            None => format!("{} - no analyzer produced a usable signal", self.label),
        }
    }
}

/// Fuses a [`PipelineResult`] into a [`Verdict`].
///
/// # Example
///
/// ```rust,ignore
/// let aggregator = VerdictAggregator::new();
/// let verdict = aggregator.aggregate(&result);
/// println!("{}", verdict.summary());
/// ```
#[derive(Clone)]
pub struct VerdictAggregator {
    config: ScoringConfig,
    extractor: ConfidenceExtractor,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl std::fmt::Debug for VerdictAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerdictAggregator")
            .field("config_version", &self.config.version)
            .field("extractor", &self.extractor)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Default for VerdictAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl VerdictAggregator {
    /// Creates an aggregator with the shipped scoring table.
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            extractor: ConfidenceExtractor::default(),
            metrics: None,
        }
    }

    /// Creates an aggregator with a validated custom table.
    pub fn with_config(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Uses a custom extractor.
    pub fn with_extractor(mut self, extractor: ConfidenceExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Reports each verdict label to a metrics recorder.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The scoring table.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Computes the verdict for a pipeline result.
    pub fn aggregate(&self, result: &PipelineResult) -> Verdict {
        let config = &self.config;

        let mut records = score::extract_scores(result, &self.extractor);
        score::calibrate_all(&mut records, config);

        let categories: Vec<CategorySummary> = MethodCategory::ALL
            .iter()
            .map(|category| CategorySummary {
                category: *category,
                mean: score::category_mean(&records, *category),
                methods: records
                    .iter()
                    .filter(|r| r.category == *category && r.is_scored())
                    .count(),
            })
            .collect();
        let agreement = AgreementLevel::between(
            score::category_mean(&records, MethodCategory::ComputerVision),
            score::category_mean(&records, MethodCategory::AiModel),
        );

        let scored = records.iter().filter(|r| r.is_scored()).count();
        let coverage = fusion::coverage(scored, result.stages_attempted);

        let base = Verdict {
            label: VerdictLabel::InsufficientEvidence,
            probability_percent: None,
            confidence: 0.0,
            reasoning: Vec::new(),
            scores: Vec::new(),
            boost: Boost::NONE.factor,
            coverage,
            categories,
            agreement,
            definitive_stage: None,
            config_version: config.version,
            created_at: Utc::now(),
        };

        let verdict = if scored == 0 {
            Verdict {
                reasoning: vec!["No analyzer produced a usable signal".to_string()],
                scores: records,
                ..base
            }
        } else if let Some(decisive) = score::find_definitive(&records, config) {
            let marker = result
                .result(&decisive.stage)
                .and_then(|output| self.extractor.generative_marker(output));
            Verdict {
                label: VerdictLabel::ConfirmedAiGenerated,
                probability_percent: Some(100.0),
                confidence: config.definitive_confidence,
                reasoning: vec![reasoning::definitive_statement(decisive, marker)],
                definitive_stage: Some(decisive.stage.clone()),
                scores: records,
                ..base
            }
        } else {
            match fusion::fuse(&mut records, result.stages_attempted, config) {
                Some((final_score, boost)) => {
                    let calibrated: Vec<f64> = records.iter().filter_map(|r| r.calibrated).collect();
                    let bands = mapping::effective_thresholds(config, calibrated.len());
                    Verdict {
                        label: mapping::map_label(final_score, &bands),
                        probability_percent: Some(final_score * 100.0),
                        confidence: mapping::confidence(&calibrated, boost, &config.confidence),
                        reasoning: reasoning::explain(&records, &config.confidence),
                        boost: boost.factor,
                        scores: records,
                        ..base
                    }
                }
                None => Verdict {
                    scores: records,
                    ..base
                },
            }
        };

        tracing::debug!(
            fingerprint = %result.fingerprint.short(),
            label = verdict.label.as_str(),
            probability = ?verdict.probability_percent,
            confidence = verdict.confidence,
            boost = verdict.boost,
            scored_methods = scored,
            "Verdict computed"
        );
        crate::audit::emit_verdict(result, &verdict);
        if let Some(metrics) = &self.metrics {
            metrics.record_verdict(verdict.label);
        }

        verdict
    }
}
