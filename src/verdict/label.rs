//! Verdict labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The discrete, human-facing outcome.
///
/// Ordered from "no decision" through "authentic" to "confirmed AI", so a
/// higher label never means weaker evidence of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    /// No analyzer produced a usable signal.
    InsufficientEvidence,
    /// Strong evidence of an authentic capture.
    VeryLikelyAuthentic,
    /// Evidence leans authentic.
    LikelyAuthentic,
    /// Mixed evidence with some generation indicators.
    PossiblyAiGenerated,
    /// Evidence leans towards generation.
    LikelyAiGenerated,
    /// Strong, corroborated evidence of generation.
    VeryLikelyAiGenerated,
    /// Provenance metadata or credentials identify a generator.
    ConfirmedAiGenerated,
}

impl VerdictLabel {
    /// All labels in ascending order.
    pub const ALL: [VerdictLabel; 7] = [
        VerdictLabel::InsufficientEvidence,
        VerdictLabel::VeryLikelyAuthentic,
        VerdictLabel::LikelyAuthentic,
        VerdictLabel::PossiblyAiGenerated,
        VerdictLabel::LikelyAiGenerated,
        VerdictLabel::VeryLikelyAiGenerated,
        VerdictLabel::ConfirmedAiGenerated,
    ];

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientEvidence => "insufficient_evidence",
            Self::VeryLikelyAuthentic => "very_likely_authentic",
            Self::LikelyAuthentic => "likely_authentic",
            Self::PossiblyAiGenerated => "possibly_ai_generated",
            Self::LikelyAiGenerated => "likely_ai_generated",
            Self::VeryLikelyAiGenerated => "very_likely_ai_generated",
            Self::ConfirmedAiGenerated => "confirmed_ai_generated",
        }
    }

    /// Display text.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InsufficientEvidence => "Insufficient evidence",
            Self::VeryLikelyAuthentic => "Very likely authentic",
            Self::LikelyAuthentic => "Likely authentic",
            Self::PossiblyAiGenerated => "Possibly AI-generated",
            Self::LikelyAiGenerated => "Likely AI-generated",
            Self::VeryLikelyAiGenerated => "Very likely AI-generated",
            Self::ConfirmedAiGenerated => "Confirmed AI-generated",
        }
    }

    /// Returns `true` for labels that lean towards generation.
    pub fn is_ai(&self) -> bool {
        *self >= Self::PossiblyAiGenerated
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
