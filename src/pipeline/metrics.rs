//! Pipeline metrics.
//!
//! The runner reports to a [`MetricsRecorder`]. Exactly one of
//! `record_cache_hit` / `record_cache_miss` is called per invocation; the
//! other hooks are optional.

use crate::verdict::VerdictLabel;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The analyzer returned a result.
    Completed,
    /// The analyzer returned an error.
    Failed,
    /// The analyzer ran past its timeout.
    TimedOut,
}

/// Sink for pipeline counters.
pub trait MetricsRecorder: Send + Sync + Debug {
    /// An invocation was served from the cache.
    fn record_cache_hit(&self);

    /// An invocation missed the cache.
    fn record_cache_miss(&self);

    /// A stage finished.
    fn record_stage(&self, _stage: &str, _outcome: StageOutcome, _duration: Duration) {}

    /// A run ended early on definitive evidence.
    fn record_early_exit(&self) {}

    /// A run finished computing (cache misses only).
    fn record_run(&self, _duration: Duration, _stages_run: usize) {}

    /// A verdict was produced.
    fn record_verdict(&self, _label: VerdictLabel) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_cache_hit(&self) {}
    fn record_cache_miss(&self) {}
}

/// In-process atomic counters.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    runs: AtomicU64,
    early_exits: AtomicU64,
    run_time_ms: AtomicU64,
    stages_completed: AtomicU64,
    stages_failed: AtomicU64,
    stages_timed_out: AtomicU64,
    verdicts: [AtomicU64; VerdictLabel::ALL.len()],
}

impl PipelineMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

        let cache_hits = load(&self.cache_hits);
        let cache_misses = load(&self.cache_misses);
        let runs = load(&self.runs);
        let early_exits = load(&self.early_exits);
        let run_time_ms = load(&self.run_time_ms);

        let ratio = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64
            }
        };

        let verdicts = VerdictLabel::ALL
            .iter()
            .map(|label| (label.as_str().to_string(), load(&self.verdicts[label.index()])))
            .collect();

        MetricsSnapshot {
            cache_hits,
            cache_misses,
            cache_hit_rate: ratio(cache_hits, cache_hits + cache_misses),
            runs,
            early_exits,
            early_exit_rate: ratio(early_exits, runs),
            average_run_ms: ratio(run_time_ms, runs),
            stages_completed: load(&self.stages_completed),
            stages_failed: load(&self.stages_failed),
            stages_timed_out: load(&self.stages_timed_out),
            verdicts,
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.runs,
            &self.early_exits,
            &self.run_time_ms,
            &self.stages_completed,
            &self.stages_failed,
            &self.stages_timed_out,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for counter in &self.verdicts {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl MetricsRecorder for PipelineMetrics {
    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_stage(&self, _stage: &str, outcome: StageOutcome, _duration: Duration) {
        let counter = match outcome {
            StageOutcome::Completed => &self.stages_completed,
            StageOutcome::Failed => &self.stages_failed,
            StageOutcome::TimedOut => &self.stages_timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_early_exit(&self) {
        self.early_exits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_run(&self, duration: Duration, _stages_run: usize) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.run_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    fn record_verdict(&self, label: VerdictLabel) {
        self.verdicts[label.index()].fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Invocations served from cache.
    pub cache_hits: u64,
    /// Invocations that missed the cache.
    pub cache_misses: u64,
    /// Hits over all lookups.
    pub cache_hit_rate: f64,
    /// Completed computations.
    pub runs: u64,
    /// Computations that ended early.
    pub early_exits: u64,
    /// Early exits over computations.
    pub early_exit_rate: f64,
    /// Mean computation time in milliseconds.
    pub average_run_ms: f64,
    /// Stages that returned a result.
    pub stages_completed: u64,
    /// Stages that returned an error.
    pub stages_failed: u64,
    /// Stages that timed out.
    pub stages_timed_out: u64,
    /// Verdict counts keyed by label name.
    pub verdicts: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let metrics = PipelineMetrics::new();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_cache_hit();
        metrics.record_run(Duration::from_millis(100), 3);
        metrics.record_run(Duration::from_millis(300), 12);
        metrics.record_early_exit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hit_rate, 0.25);
        assert_eq!(snapshot.early_exit_rate, 0.5);
        assert_eq!(snapshot.average_run_ms, 200.0);
    }

    #[test]
    fn test_stage_and_verdict_counts() {
        let metrics = PipelineMetrics::new();
        metrics.record_stage("c2pa", StageOutcome::Completed, Duration::ZERO);
        metrics.record_stage("ai-model", StageOutcome::TimedOut, Duration::ZERO);
        metrics.record_stage("exif", StageOutcome::Failed, Duration::ZERO);
        metrics.record_verdict(VerdictLabel::LikelyAuthentic);
        metrics.record_verdict(VerdictLabel::LikelyAuthentic);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stages_completed, 1);
        assert_eq!(snapshot.stages_timed_out, 1);
        assert_eq!(snapshot.stages_failed, 1);
        assert_eq!(snapshot.verdicts["likely_authentic"], 2);
        assert_eq!(snapshot.verdicts["confirmed_ai_generated"], 0);
        assert_eq!(snapshot.verdicts.len(), 7);

        metrics.reset();
        assert_eq!(metrics.snapshot().verdicts["likely_authentic"], 0);
        assert_eq!(metrics.snapshot().cache_hit_rate, 0.0);
    }
}
