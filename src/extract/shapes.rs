//! Known analyzer result shapes.
//!
//! Every catalog analyzer reports its evidence in its own layout. Each
//! layout gets a small serde struct with all-optional fields, so a report
//! that drifts from its shape fails to deserialize instead of producing a
//! wrong number.

use crate::core::StageKind;
use crate::extract::markers::GenerativeMarkers;
use crate::extract::signal::Signal;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The result layout a stage is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultShape {
    /// `ai_color_score`.
    ColorBalance,
    /// `advanced_assessment.advanced_ai_probability`.
    AdvancedArtifacts,
    /// `compression_ai_analysis.ai_probability`, possibly under a per-file key.
    Compression,
    /// `overall_assessment.ai_probability_score`.
    OverallAssessment,
    /// `lighting_analysis.ai_lighting_score`.
    Lighting,
    /// `object_analysis.ai_coherence_score`.
    ObjectCoherence,
    /// Certificate score on a 0-100 scale.
    C2pa,
    /// Classifier `prediction` plus `probability`.
    ModelPrediction,
    /// Free-form metadata dump searched for generator names.
    Metadata,
    /// EXIF fields.
    Exif,
    /// Unknown layout; probe the well-known field paths.
    Generic,
}

impl ResultShape {
    /// The shape a catalog stage produces. Custom stages are generic.
    pub fn for_kind(kind: &StageKind) -> Self {
        match kind {
            StageKind::ColorBalance => Self::ColorBalance,
            StageKind::AdvancedArtifacts => Self::AdvancedArtifacts,
            StageKind::Compression => Self::Compression,
            StageKind::Artifacts | StageKind::PixelAnalysis => Self::OverallAssessment,
            StageKind::LightingAnalysis => Self::Lighting,
            StageKind::ObjectCoherence => Self::ObjectCoherence,
            StageKind::C2pa => Self::C2pa,
            StageKind::AiModel => Self::ModelPrediction,
            StageKind::Metadata | StageKind::MetadataQuick => Self::Metadata,
            StageKind::Exif => Self::Exif,
            StageKind::Custom(_) => Self::Generic,
        }
    }

    /// Reads the shape out of a result.
    ///
    /// `None` means the result does not match this shape and the caller
    /// should fall back to [`probe_generic`]. `Some(NoSignal)` means the
    /// shape matched and definitely carries no evidence.
    pub fn read(&self, output: &Value, markers: &GenerativeMarkers) -> Option<Signal> {
        match self {
            Self::ColorBalance => {
                let r: ColorBalanceReport = parse(output)?;
                r.ai_color_score.or(r.ai_probability).map(Signal::from_raw)
            }
            Self::AdvancedArtifacts => {
                let r: AdvancedArtifactsReport = parse(output)?;
                r.advanced_assessment
                    .and_then(|a| a.advanced_ai_probability)
                    .or(r.ai_probability)
                    .map(Signal::from_raw)
            }
            Self::Compression => {
                let r: CompressionReport = parse(output)?;
                r.score().map(Signal::from_raw)
            }
            Self::OverallAssessment => {
                let r: OverallAssessmentReport = parse(output)?;
                r.overall_assessment
                    .and_then(|a| a.ai_probability_score)
                    .or(r.ai_probability)
                    .map(Signal::from_raw)
            }
            Self::Lighting => {
                let r: LightingReport = parse(output)?;
                r.lighting_analysis
                    .and_then(|a| a.ai_lighting_score)
                    .or(r.ai_probability)
                    .map(Signal::from_raw)
            }
            Self::ObjectCoherence => {
                let r: ObjectCoherenceReport = parse(output)?;
                r.object_analysis
                    .and_then(|a| a.ai_coherence_score)
                    .or(r.ai_probability)
                    .map(Signal::from_raw)
            }
            Self::C2pa => {
                let r: C2paReport = parse(output)?;
                r.signal()
            }
            Self::ModelPrediction => {
                let r: ModelPrediction = parse(output)?;
                r.signal()
            }
            Self::Metadata => Some(match markers.find_in(output) {
                Some(_) => Signal::Score(1.0),
                None => Signal::NoSignal,
            }),
            Self::Exif => {
                let r: ExifReport = parse(output)?;
                Some(r.signal(markers))
            }
            Self::Generic => None,
        }
    }
}

fn parse<T: DeserializeOwned>(output: &Value) -> Option<T> {
    if !output.is_object() {
        return None;
    }
    T::deserialize(output).ok()
}

#[derive(Debug, Deserialize)]
struct ColorBalanceReport {
    ai_color_score: Option<f64>,
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AdvancedArtifactsReport {
    advanced_assessment: Option<AdvancedAssessment>,
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AdvancedAssessment {
    advanced_ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CompressionReport {
    compression_ai_analysis: Option<CompressionAnalysis>,
    ai_probability: Option<f64>,
    /// Reports for several files are keyed by file name.
    #[serde(flatten)]
    per_file: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CompressionAnalysis {
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NestedCompression {
    compression_ai_analysis: Option<CompressionAnalysis>,
}

impl CompressionReport {
    fn score(&self) -> Option<f64> {
        if let Some(p) = self
            .compression_ai_analysis
            .as_ref()
            .and_then(|a| a.ai_probability)
        {
            return Some(p);
        }
        let nested = self.per_file.values().find_map(|v| {
            let n: NestedCompression = parse(v)?;
            n.compression_ai_analysis?.ai_probability
        });
        nested.or(self.ai_probability)
    }
}

#[derive(Debug, Deserialize)]
struct OverallAssessmentReport {
    overall_assessment: Option<OverallAssessment>,
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OverallAssessment {
    ai_probability_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LightingReport {
    lighting_analysis: Option<LightingAnalysis>,
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LightingAnalysis {
    ai_lighting_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObjectCoherenceReport {
    object_analysis: Option<ObjectAnalysis>,
    ai_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObjectAnalysis {
    ai_coherence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct C2paReport {
    score: Option<f64>,
    score_confidence: Option<f64>,
}

impl C2paReport {
    fn signal(&self) -> Option<Signal> {
        let score = self.score?;
        // A zero score with zero confidence is the tool's "no manifest" answer.
        if score == 0.0 && self.score_confidence.unwrap_or(0.0) == 0.0 {
            return Some(Signal::NoSignal);
        }
        Some(Signal::from_raw(score / 100.0))
    }
}

#[derive(Debug, Deserialize)]
struct ModelPrediction {
    prediction: Option<String>,
    probability: Option<f64>,
}

impl ModelPrediction {
    fn signal(&self) -> Option<Signal> {
        let label = self.prediction.as_deref()?;
        let p = self.probability?;
        if !p.is_finite() {
            return Some(Signal::NoSignal);
        }
        let p = p.clamp(0.0, 1.0);
        Some(if label.eq_ignore_ascii_case("fake") {
            Signal::from_raw(p)
        } else {
            Signal::from_raw(1.0 - p)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExifReport {
    ai_probability: Option<f64>,
    #[serde(rename = "Software", alias = "software")]
    software: Option<Value>,
}

impl ExifReport {
    fn signal(&self, markers: &GenerativeMarkers) -> Signal {
        if let Some(p) = self.ai_probability {
            return Signal::from_raw(p);
        }
        match &self.software {
            Some(software) if markers.find_in(software).is_some() => Signal::Score(1.0),
            _ => Signal::NoSignal,
        }
    }
}

/// Probes the well-known field paths in a fixed order.
///
/// Used for custom stages and for catalog stages whose output does not match
/// their usual shape.
pub fn probe_generic(output: &Value) -> Signal {
    const PATHS: &[&str] = &[
        "/ai_probability",
        "/ai_color_score",
        "/advanced_assessment/advanced_ai_probability",
        "/compression_ai_analysis/ai_probability",
        "/overall_assessment/ai_probability_score",
    ];

    for path in PATHS {
        if let Some(v) = output.pointer(path).and_then(Value::as_f64) {
            return Signal::from_raw(v);
        }
    }

    if let Some(map) = output.as_object() {
        let nested = map.values().find_map(|v| {
            v.pointer("/compression_ai_analysis/ai_probability")
                .and_then(Value::as_f64)
        });
        if let Some(v) = nested {
            return Signal::from_raw(v);
        }
    }

    if let Some(score) = output.get("score").and_then(Value::as_f64) {
        return Signal::from_raw(score / 100.0);
    }

    for path in [
        "/lighting_analysis/ai_lighting_score",
        "/object_analysis/ai_coherence_score",
    ] {
        if let Some(v) = output.pointer(path).and_then(Value::as_f64) {
            return Signal::from_raw(v);
        }
    }

    let prediction = output.get("prediction").and_then(Value::as_str);
    let probability = output.get("probability").and_then(Value::as_f64);
    if let (Some(label), Some(p)) = (prediction, probability) {
        let p = p.clamp(0.0, 1.0);
        return if label.eq_ignore_ascii_case("fake") {
            Signal::from_raw(p)
        } else {
            Signal::from_raw(1.0 - p)
        };
    }

    Signal::NoSignal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(shape: ResultShape, output: Value) -> Option<Signal> {
        shape.read(&output, &GenerativeMarkers::default())
    }

    #[test]
    fn test_color_balance() {
        assert_eq!(
            read(ResultShape::ColorBalance, json!({"ai_color_score": 0.62})),
            Some(Signal::Score(0.62))
        );
        assert_eq!(
            read(ResultShape::ColorBalance, json!({"ai_probability": 0.3})),
            Some(Signal::Score(0.3))
        );
    }

    #[test]
    fn test_compression_flat_and_per_file() {
        assert_eq!(
            read(
                ResultShape::Compression,
                json!({"compression_ai_analysis": {"ai_probability": 0.4}})
            ),
            Some(Signal::Score(0.4))
        );
        assert_eq!(
            read(
                ResultShape::Compression,
                json!({"upload_123.jpg": {"compression_ai_analysis": {"ai_probability": 0.7}}})
            ),
            Some(Signal::Score(0.7))
        );
        assert_eq!(read(ResultShape::Compression, json!({"quality": 88})), None);
    }

    #[test]
    fn test_wrong_type_is_a_mismatch() {
        assert_eq!(
            read(ResultShape::ColorBalance, json!({"ai_color_score": "high"})),
            None
        );
        assert_eq!(read(ResultShape::Lighting, json!([1, 2, 3])), None);
    }

    #[test]
    fn test_c2pa_scale_and_no_manifest() {
        assert_eq!(
            read(ResultShape::C2pa, json!({"score": 95, "score_confidence": 0.9})),
            Some(Signal::Score(0.95))
        );
        assert_eq!(
            read(ResultShape::C2pa, json!({"score": 0, "score_confidence": 0})),
            Some(Signal::NoSignal)
        );
        assert_eq!(
            read(ResultShape::C2pa, json!({"score": 0, "score_confidence": 0.8})),
            Some(Signal::Score(0.0))
        );
    }

    #[test]
    fn test_model_prediction_orientation() {
        assert_eq!(
            read(
                ResultShape::ModelPrediction,
                json!({"prediction": "fake", "probability": 0.9})
            ),
            Some(Signal::Score(0.9))
        );
        let real = read(
            ResultShape::ModelPrediction,
            json!({"prediction": "real", "probability": 0.8}),
        )
        .and_then(|s| s.score())
        .unwrap();
        assert!((real - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_metadata_keyword_or_nothing() {
        assert_eq!(
            read(
                ResultShape::Metadata,
                json!({"Creator": {"Tool": "DALL-E 3"}})
            ),
            Some(Signal::Score(1.0))
        );
        assert_eq!(
            read(ResultShape::Metadata, json!({"Make": "Canon", "score": 40})),
            Some(Signal::NoSignal)
        );
    }

    #[test]
    fn test_exif_software_marker() {
        assert_eq!(
            read(ResultShape::Exif, json!({"Software": "Stable Diffusion XL"})),
            Some(Signal::Score(1.0))
        );
        assert_eq!(
            read(ResultShape::Exif, json!({"Software": "Lightroom"})),
            Some(Signal::NoSignal)
        );
        assert_eq!(
            read(ResultShape::Exif, json!({"ai_probability": 0.25})),
            Some(Signal::Score(0.25))
        );
    }

    #[test]
    fn test_generic_probe_order() {
        assert_eq!(probe_generic(&json!({"ai_probability": 0.5, "score": 10})), Signal::Score(0.5));
        assert_eq!(probe_generic(&json!({"score": 40})), Signal::Score(0.4));
        assert_eq!(
            probe_generic(&json!({"object_analysis": {"ai_coherence_score": 0.33}})),
            Signal::Score(0.33)
        );
        assert_eq!(probe_generic(&json!({"width": 1024})), Signal::NoSignal);
        assert_eq!(probe_generic(&json!("text")), Signal::NoSignal);
    }
}
