//! Human-readable reasoning lines.

use crate::core::StageKind;
use crate::verdict::config::ConfidenceConfig;
use crate::verdict::score::ScoreRecord;

/// One statement about a scored method; `None` for methods without a signal.
///
/// The band is chosen from the calibrated score. When calibration moved the
/// score, the analyzer's own reading is appended.
pub fn method_statement(record: &ScoreRecord, bands: &ConfidenceConfig) -> Option<String> {
    let score = record.calibrated?;
    let mut line = if score >= bands.strong_high {
        format!(
            "{}: strong AI indicators ({:.0}% probability)",
            record.stage,
            score * 100.0
        )
    } else if score <= bands.strong_low {
        format!(
            "{}: authenticity indicators ({:.0}% authentic)",
            record.stage,
            (1.0 - score) * 100.0
        )
    } else {
        format!(
            "{}: moderate signals ({:.0}% probability)",
            record.stage,
            score * 100.0
        )
    };
    if let Some(raw) = record.raw.score() {
        if (raw - score).abs() >= 0.005 {
            line.push_str(&format!(
                ", analyzer reported {:.0}% AI before calibration",
                raw * 100.0
            ));
        }
    }
    Some(line)
}

/// Statements for every scored method, in record order.
pub fn explain(records: &[ScoreRecord], bands: &ConfidenceConfig) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| method_statement(r, bands))
        .collect()
}

/// Statement for the record that decided a verdict on its own.
pub fn definitive_statement(record: &ScoreRecord, marker: Option<&str>) -> String {
    match (StageKind::from_name(&record.stage), marker) {
        (StageKind::C2pa, _) => format!(
            "{}: content credentials confirm AI generation",
            record.stage
        ),
        (_, Some(marker)) => format!(
            "{}: metadata names generative tool '{marker}'",
            record.stage
        ),
        _ => format!("{}: definitive AI metadata found", record.stage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MethodCategory;
    use crate::extract::Signal;

    fn record(stage: &str, score: Option<f64>) -> ScoreRecord {
        ScoreRecord {
            stage: stage.into(),
            raw: score.map_or(Signal::NoSignal, Signal::Score),
            category: StageKind::from_name(stage).category(),
            calibrated: score,
            weight: None,
        }
    }

    #[test]
    fn test_statement_bands() {
        let bands = ConfidenceConfig::default();
        assert_eq!(
            method_statement(&record("artifacts", Some(0.84)), &bands).unwrap(),
            "artifacts: strong AI indicators (84% probability)"
        );
        assert_eq!(
            method_statement(&record("compression", Some(0.1)), &bands).unwrap(),
            "compression: authenticity indicators (90% authentic)"
        );
        assert_eq!(
            method_statement(&record("pixel-analysis", Some(0.5)), &bands).unwrap(),
            "pixel-analysis: moderate signals (50% probability)"
        );
        assert!(method_statement(&record("metadata", None), &bands).is_none());
    }

    #[test]
    fn test_calibrated_statement_shows_raw_reading() {
        let bands = ConfidenceConfig::default();
        let compression = ScoreRecord {
            stage: "compression".into(),
            raw: Signal::Score(0.8),
            category: MethodCategory::ComputerVision,
            calibrated: Some(0.16),
            weight: None,
        };
        assert_eq!(
            method_statement(&compression, &bands).unwrap(),
            "compression: authenticity indicators (84% authentic), \
             analyzer reported 80% AI before calibration"
        );
    }

    #[test]
    fn test_explain_skips_unscored() {
        let bands = ConfidenceConfig::default();
        let lines = explain(
            &[record("exif", None), record("ai-model", Some(0.9))],
            &bands,
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ai-model"));
    }

    #[test]
    fn test_definitive_statements() {
        let c2pa = record("c2pa", Some(0.97));
        assert_eq!(c2pa.category, MethodCategory::MetadataForensics);
        assert!(definitive_statement(&c2pa, None).contains("content credentials"));
        assert!(definitive_statement(&record("metadata", Some(1.0)), Some("Midjourney"))
            .contains("'Midjourney'"));
        assert!(definitive_statement(&record("exif", Some(1.0)), None).contains("definitive"));
    }
}
