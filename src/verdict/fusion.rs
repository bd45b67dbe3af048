//! Fusion of calibrated scores into one number.
//!
//! weighting → consistency boost → quality adjustment → clamp.

use crate::core::MethodCategory;
use crate::verdict::config::{AdaptiveWeighting, BoostConfig, QualityConfig, ScoringConfig};
use crate::verdict::score::ScoreRecord;

/// Base weight times the adaptive multiplier for decisive scores.
pub fn adaptive_weight(base: f64, score: f64, adaptive: &AdaptiveWeighting) -> f64 {
    if score >= adaptive.high_score {
        base * adaptive.high_multiplier
    } else if score <= adaptive.low_score {
        base * adaptive.low_multiplier
    } else {
        base
    }
}

/// Weighted mean of the calibrated scores.
///
/// Fills in each scored record's effective weight. Returns `None` when no
/// record is scored. If every weight is zero the scores are averaged
/// unweighted.
pub fn weighted_score(records: &mut [ScoreRecord], config: &ScoringConfig) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut plain_sum = 0.0;
    let mut count = 0usize;

    for record in records.iter_mut() {
        let Some(score) = record.calibrated else {
            continue;
        };
        let weight = adaptive_weight(config.weight_for(&record.stage), score, &config.adaptive);
        record.weight = Some(weight);

        weighted_sum += score * weight;
        total_weight += weight;
        plain_sum += score;
        count += 1;
    }

    if count == 0 {
        None
    } else if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        Some(plain_sum / count as f64)
    }
}

/// Result of the corroboration rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boost {
    /// Combined factor, clamped to the configured bounds.
    pub factor: f64,
    /// Whether any corroboration rule fired.
    pub corroborated: bool,
}

impl Boost {
    /// The neutral boost.
    pub const NONE: Boost = Boost {
        factor: 1.0,
        corroborated: false,
    };
}

/// Multiplicative factor rewarding agreement between methods.
///
/// Computer-vision methods agreeing on generation raise the score, agreeing
/// on authenticity lower it. A positive model prediction backed by at least
/// one computer-vision method raises it further; a negative prediction
/// backed by two authentic computer-vision readings lowers it.
pub fn consistency_boost(records: &[ScoreRecord], config: &BoostConfig) -> Boost {
    let cv: Vec<f64> = records
        .iter()
        .filter(|r| r.category == MethodCategory::ComputerVision)
        .filter_map(|r| r.calibrated)
        .collect();
    let cv_positive = cv.iter().filter(|s| **s >= config.cv_positive).count();
    let cv_negative = cv.iter().filter(|s| **s <= config.cv_negative).count();

    let mut factor = 1.0;
    let mut corroborated = false;

    if cv_positive >= 3 {
        factor *= config.strong_agreement;
        corroborated = true;
    } else if cv_positive == 2 {
        factor *= config.pair_agreement;
        corroborated = true;
    }

    if cv_negative >= 3 {
        factor /= config.strong_agreement;
        corroborated = true;
    } else if cv_negative == 2 {
        factor /= config.pair_agreement;
        corroborated = true;
    }

    let model = records
        .iter()
        .filter(|r| r.category == MethodCategory::AiModel)
        .filter_map(|r| r.calibrated)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

    if let Some(model) = model {
        if model >= config.model_positive && cv_positive >= 1 {
            factor *= config.model_corroborated;
            corroborated = true;
        }
        if model <= config.model_negative && cv_negative >= 2 {
            factor *= config.model_authentic;
            corroborated = true;
        }
    }

    Boost {
        factor: factor.clamp(config.min, config.max),
        corroborated,
    }
}

/// Fraction of attempted stages that produced a score.
pub fn coverage(scored: usize, attempted: usize) -> f64 {
    let attempted = attempted.max(scored);
    if attempted == 0 {
        0.0
    } else {
        scored as f64 / attempted as f64
    }
}

/// Sharpens well-covered scores away from 0.5 and softens poorly covered
/// ones towards it.
pub fn quality_adjust(score: f64, coverage: f64, config: &QualityConfig) -> f64 {
    if coverage >= config.high_coverage {
        0.5 + (score - 0.5) * (1.0 + config.sharpen)
    } else if coverage < config.low_coverage {
        0.5 + (score - 0.5) * (1.0 - config.soften)
    } else {
        score
    }
}

/// The full fusion: weighting, boost, quality, clamp.
///
/// Returns the final score and the boost, or `None` without scored records.
pub fn fuse(
    records: &mut [ScoreRecord],
    attempted: usize,
    config: &ScoringConfig,
) -> Option<(f64, Boost)> {
    let base = weighted_score(records, config)?;
    let boost = consistency_boost(records, &config.boost);
    let scored = records.iter().filter(|r| r.calibrated.is_some()).count();
    let adjusted = quality_adjust(base * boost.factor, coverage(scored, attempted), &config.quality);
    Some((adjusted.clamp(0.0, 1.0), boost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Signal;

    fn record(stage: &str, category: MethodCategory, calibrated: f64) -> ScoreRecord {
        ScoreRecord {
            stage: stage.into(),
            raw: Signal::Score(calibrated),
            category,
            calibrated: Some(calibrated),
            weight: None,
        }
    }

    fn cv(stage: &str, score: f64) -> ScoreRecord {
        record(stage, MethodCategory::ComputerVision, score)
    }

    fn model(score: f64) -> ScoreRecord {
        record("ai-model", MethodCategory::AiModel, score)
    }

    #[test]
    fn test_adaptive_weight() {
        let adaptive = AdaptiveWeighting::default();
        assert!((adaptive_weight(3.0, 0.85, &adaptive) - 3.6).abs() < 1e-9);
        assert!((adaptive_weight(3.0, 0.1, &adaptive) - 3.9).abs() < 1e-9);
        assert_eq!(adaptive_weight(3.0, 0.5, &adaptive), 3.0);
    }

    #[test]
    fn test_weighted_score_skips_unscored() {
        let config = ScoringConfig::default();
        let mut records = vec![
            cv("artifacts", 0.5),
            cv("color-balance", 0.5),
            ScoreRecord {
                stage: "metadata".into(),
                raw: Signal::NoSignal,
                category: MethodCategory::MetadataForensics,
                calibrated: None,
                weight: None,
            },
        ];
        let score = weighted_score(&mut records, &config).unwrap();
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(records[0].weight, Some(3.0));
        assert_eq!(records[2].weight, None);

        let mut empty: Vec<ScoreRecord> = Vec::new();
        assert_eq!(weighted_score(&mut empty, &config), None);
    }

    #[test]
    fn test_zero_weights_fall_back_to_mean() {
        let config = ScoringConfig::default()
            .with_weight("artifacts", 0.0)
            .with_weight("color-balance", 0.0);
        let mut records = vec![cv("artifacts", 0.4), cv("color-balance", 0.6)];
        assert!((weighted_score(&mut records, &config).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_boost_rules() {
        let config = BoostConfig::default();

        let three = [cv("a", 0.8), cv("b", 0.7), cv("c", 0.65)];
        let boost = consistency_boost(&three, &config);
        assert!((boost.factor - 1.4).abs() < 1e-9);
        assert!(boost.corroborated);

        let two = [cv("a", 0.8), cv("b", 0.7), cv("c", 0.5)];
        assert!((consistency_boost(&two, &config).factor - 1.2).abs() < 1e-9);

        let damped = [cv("a", 0.1), cv("b", 0.2), cv("c", 0.25)];
        assert!((consistency_boost(&damped, &config).factor - 1.0 / 1.4).abs() < 1e-9);

        let lone = [cv("a", 0.8), cv("b", 0.5)];
        assert_eq!(consistency_boost(&lone, &config), Boost::NONE);
    }

    #[test]
    fn test_boost_model_rules_and_clamp() {
        let config = BoostConfig::default();

        let corroborated = [cv("a", 0.8), cv("b", 0.5), model(0.9)];
        assert!((consistency_boost(&corroborated, &config).factor - 1.3).abs() < 1e-9);

        // 1.4 * 1.3 = 1.82, within bounds.
        let strong = [cv("a", 0.8), cv("b", 0.9), cv("c", 0.7), model(0.9)];
        assert!((consistency_boost(&strong, &config).factor - 1.82).abs() < 1e-9);

        // (1 / 1.4) * 0.6 ≈ 0.43.
        let authentic = [cv("a", 0.1), cv("b", 0.2), cv("c", 0.1), model(0.1)];
        let factor = consistency_boost(&authentic, &config).factor;
        assert!((factor - 0.6 / 1.4).abs() < 1e-9);

        let tight = BoostConfig {
            max: 1.5,
            ..BoostConfig::default()
        };
        assert_eq!(consistency_boost(&strong, &tight).factor, 1.5);
    }

    #[test]
    fn test_quality_adjustment() {
        let quality = QualityConfig::default();
        assert!((quality_adjust(0.8, 0.9, &quality) - 0.815).abs() < 1e-9);
        assert!((quality_adjust(0.2, 0.9, &quality) - 0.185).abs() < 1e-9);
        assert!((quality_adjust(0.8, 0.3, &quality) - 0.785).abs() < 1e-9);
        assert_eq!(quality_adjust(0.8, 0.6, &quality), 0.8);
        assert_eq!(coverage(3, 4), 0.75);
        assert_eq!(coverage(0, 0), 0.0);
        assert_eq!(coverage(2, 0), 1.0);
    }

    #[test]
    fn test_fuse_is_clamped() {
        let config = ScoringConfig::default();
        let mut records = vec![cv("a", 1.0), cv("b", 1.0), cv("c", 1.0), model(1.0)];
        let (score, boost) = fuse(&mut records, 4, &config).unwrap();
        assert_eq!(score, 1.0);
        assert!(boost.corroborated);

        let mut records = vec![cv("a", 0.0), cv("b", 0.0), cv("c", 0.0)];
        let (score, _) = fuse(&mut records, 3, &config).unwrap();
        assert_eq!(score, 0.0);
    }
}
