//! Pipeline execution.
//!
//! The [`PipelineRunner`] hashes an artifact, serves repeat content from the
//! [`ContentCache`](crate::cache::ContentCache), and otherwise runs the
//! registered stages tier by tier:
//!
//! 1. Fast-track stages run first. A definitive metadata-forensics result
//!    ends the run early.
//! 2. The remaining tiers run in ascending priority. Stages of one tier run
//!    concurrently unless one depends on another.
//! 3. Failed or timed-out stages are left out of the result.
//!
//! Cancelling the [`AnalysisContext`](crate::core::AnalysisContext) or
//! passing its deadline aborts the run without caching anything.

mod config;
pub mod early_exit;
mod metrics;
mod runner;

pub use config::PipelineConfig;
pub use early_exit::EarlyExit;
pub use metrics::{
    MetricsRecorder, MetricsSnapshot, NoopMetrics, PipelineMetrics, StageOutcome,
};
pub use runner::{PipelineRunner, PipelineRunnerBuilder};
