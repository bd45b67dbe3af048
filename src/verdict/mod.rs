//! Verdict aggregation.
//!
//! Turns a [`PipelineResult`](crate::core::PipelineResult) into a discrete
//! [`Verdict`] with a confidence value and reasoning. Each step is a plain
//! function over [`ScoreRecord`]s:
//!
//! 1. extraction and categorization ([`score::extract_scores`])
//! 2. definitive-evidence short-circuit ([`score::find_definitive`])
//! 3. calibration ([`score::calibrate_all`])
//! 4. adaptive weighting ([`fusion::weighted_score`])
//! 5. consistency boost ([`fusion::consistency_boost`])
//! 6. quality adjustment ([`fusion::quality_adjust`])
//! 7. clamp, then label and confidence ([`mapping`])
//! 8. reasoning ([`reasoning::explain`])
//!
//! All constants come from a versioned [`ScoringConfig`].

pub mod aggregator;
pub mod config;
pub mod fusion;
pub mod label;
pub mod mapping;
pub mod reasoning;
pub mod score;

pub use aggregator::{AgreementLevel, CategorySummary, Verdict, VerdictAggregator};
pub use config::{
    AdaptiveWeighting, BoostConfig, ConfidenceConfig, QualityConfig, ScoringConfig, Threshold,
};
pub use fusion::Boost;
pub use label::VerdictLabel;
pub use score::ScoreRecord;
