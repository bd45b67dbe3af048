//! The normalized output of extraction.

use serde::{Deserialize, Serialize};

/// A normalized evidence reading from one stage.
///
/// `Score` always means "probability the artifact is synthetic". `NoSignal`
/// means the stage said nothing usable. It is never equivalent to a score
/// of `0.0`, which is a confident "authentic" reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Signal {
    /// A probability-like score in [0, 1].
    Score(f64),
    /// The stage carried no usable evidence.
    NoSignal,
}

impl Signal {
    /// Normalizes a raw reading: non-finite values carry no signal, finite
    /// values are clamped to [0, 1].
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_finite() {
            Self::Score(raw.clamp(0.0, 1.0))
        } else {
            Self::NoSignal
        }
    }

    /// Normalizes an optional raw reading.
    pub fn from_option(raw: Option<f64>) -> Self {
        raw.map_or(Self::NoSignal, Self::from_raw)
    }

    /// Returns the score, if there is one.
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Score(score) => Some(*score),
            Self::NoSignal => None,
        }
    }

    /// Returns `true` if this reading carries a score.
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Score(_))
    }
}
