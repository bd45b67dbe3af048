//! Mapping a final score to a label and a confidence.

use crate::verdict::config::{ConfidenceConfig, ScoringConfig, Threshold};
use crate::verdict::fusion::Boost;
use crate::verdict::label::VerdictLabel;

/// The bands in effect for a verdict with `scored_methods` inputs.
///
/// With fewer than `min_methods` inputs every band above the first moves up
/// by `sparse_shift`, capped at 1.0.
pub fn effective_thresholds(config: &ScoringConfig, scored_methods: usize) -> Vec<Threshold> {
    let shift = if scored_methods < config.min_methods {
        config.sparse_shift
    } else {
        0.0
    };
    config
        .thresholds
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if i == 0 {
                *t
            } else {
                Threshold::new((t.lower + shift).min(1.0), t.label)
            }
        })
        .collect()
}

/// The label of the highest band whose lower bound does not exceed `score`.
pub fn map_label(score: f64, thresholds: &[Threshold]) -> VerdictLabel {
    thresholds
        .iter()
        .rev()
        .find(|t| score >= t.lower)
        .or_else(|| thresholds.first())
        .map_or(VerdictLabel::InsufficientEvidence, |t| t.label)
}

/// Population variance.
fn variance(scores: &[f64]) -> f64 {
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n
}

/// Agreement between methods: `1 - variance * scale`, floored at 0.
///
/// A single method has nothing to agree with and scores 0.5.
pub fn agreement(scores: &[f64], config: &ConfidenceConfig) -> f64 {
    if scores.len() < 2 {
        return 0.5;
    }
    (1.0 - variance(scores) * config.variance_scale).clamp(0.0, 1.0)
}

/// Fraction of methods in a strong band.
pub fn strong_fraction(scores: &[f64], config: &ConfidenceConfig) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let strong = scores
        .iter()
        .filter(|s| **s >= config.strong_high || **s <= config.strong_low)
        .count();
    strong as f64 / scores.len() as f64
}

/// Confidence of a scored verdict, clamped to `[floor, ceiling]`.
pub fn confidence(scores: &[f64], boost: Boost, config: &ConfidenceConfig) -> f64 {
    let mut value = config.strong_weight * strong_fraction(scores, config)
        + config.agreement_weight * agreement(scores, config);
    if boost.corroborated {
        value += config.corroboration_bonus;
    }
    value.clamp(config.floor, config.ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_and_shift() {
        let config = ScoringConfig::default();
        let full = effective_thresholds(&config, 5);
        assert_eq!(map_label(0.0, &full), VerdictLabel::VeryLikelyAuthentic);
        assert_eq!(map_label(0.2, &full), VerdictLabel::LikelyAuthentic);
        assert_eq!(map_label(0.5, &full), VerdictLabel::PossiblyAiGenerated);
        assert_eq!(map_label(0.62, &full), VerdictLabel::LikelyAiGenerated);
        assert_eq!(map_label(1.0, &full), VerdictLabel::VeryLikelyAiGenerated);

        let sparse = effective_thresholds(&config, 2);
        assert_eq!(sparse[0].lower, 0.0);
        assert!((sparse[3].lower - 0.65).abs() < 1e-9);
        assert_eq!(map_label(0.62, &sparse), VerdictLabel::PossiblyAiGenerated);
    }

    #[test]
    fn test_label_is_monotonic() {
        let config = ScoringConfig::default();
        for methods in [1, 4] {
            let bands = effective_thresholds(&config, methods);
            let mut previous = VerdictLabel::InsufficientEvidence;
            for step in 0..=1000 {
                let label = map_label(step as f64 / 1000.0, &bands);
                assert!(label >= previous);
                previous = label;
            }
        }
    }

    #[test]
    fn test_agreement_and_strength() {
        let config = ConfidenceConfig::default();
        assert_eq!(agreement(&[0.8], &config), 0.5);
        assert!((agreement(&[0.8, 0.8, 0.8], &config) - 1.0).abs() < 1e-9);
        // variance 0.25 * 4 wipes out agreement.
        assert_eq!(agreement(&[0.0, 1.0], &config), 0.0);
        assert_eq!(strong_fraction(&[0.9, 0.1, 0.5, 0.6], &config), 0.5);
    }

    #[test]
    fn test_confidence_bonus_and_bounds() {
        let config = ConfidenceConfig::default();
        let scores = [0.8, 0.65, 0.6, 0.9];
        let plain = confidence(&scores, Boost::NONE, &config);
        let boosted = confidence(
            &scores,
            Boost {
                factor: 1.4,
                corroborated: true,
            },
            &config,
        );
        assert!(boosted > plain);
        assert!(boosted <= config.ceiling);

        let weak = confidence(&[0.5, 0.0, 1.0], Boost::NONE, &config);
        assert!(weak >= config.floor);
    }
}
