//! Stage-aware signal extraction.

use crate::core::{MethodCategory, StageKind, StageOutput};
use crate::extract::markers::GenerativeMarkers;
use crate::extract::shapes::{probe_generic, ResultShape};
use crate::extract::signal::Signal;

use std::collections::HashMap;

/// Normalizes heterogeneous stage results into [`Signal`]s.
///
/// Dispatch is by stage identity: catalog stages are read through their
/// typed shape, custom stages through the generic probe unless a shape
/// override maps them onto a known layout.
///
/// # Example
///
/// ```rust
/// use evidencefuse::extract::{ConfidenceExtractor, Signal};
/// use serde_json::json;
///
/// let extractor = ConfidenceExtractor::new();
/// assert_eq!(
///     extractor.extract("color-balance", &json!({ "ai_color_score": 0.7 })),
///     Signal::Score(0.7)
/// );
/// assert_eq!(
///     extractor.extract("c2pa", &json!({ "score": 0, "score_confidence": 0 })),
///     Signal::NoSignal
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfidenceExtractor {
    overrides: HashMap<String, ResultShape>,
    markers: GenerativeMarkers,
}

impl ConfidenceExtractor {
    /// Creates an extractor with the default generator markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `stage` results with `shape` instead of its default layout.
    pub fn with_shape(mut self, stage: impl Into<String>, shape: ResultShape) -> Self {
        self.overrides.insert(stage.into(), shape);
        self
    }

    /// Replaces the generative-tool markers.
    pub fn with_markers(mut self, markers: GenerativeMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// The markers used for metadata stages.
    pub fn markers(&self) -> &GenerativeMarkers {
        &self.markers
    }

    /// The shape `stage` is read with.
    pub fn shape_for(&self, stage: &str) -> ResultShape {
        self.overrides
            .get(stage)
            .copied()
            .unwrap_or_else(|| ResultShape::for_kind(&StageKind::from_name(stage)))
    }

    /// The evidence family `stage` belongs to.
    pub fn category_for(&self, stage: &str) -> MethodCategory {
        StageKind::from_name(stage).category()
    }

    /// Extracts the signal from one stage result.
    pub fn extract(&self, stage: &str, output: &StageOutput) -> Signal {
        let shape = self.shape_for(stage);
        match shape.read(output, &self.markers) {
            Some(signal) => signal,
            None => {
                let signal = probe_generic(output);
                if shape != ResultShape::Generic {
                    tracing::debug!(
                        stage = %stage,
                        shape = ?shape,
                        found = signal.is_signal(),
                        "Result did not match its shape; used generic probe"
                    );
                }
                signal
            }
        }
    }

    /// The generator marker named in a metadata-like result, if any.
    pub fn generative_marker<'a>(&'a self, output: &StageOutput) -> Option<&'a str> {
        self.markers.find_in(output)
    }
}
