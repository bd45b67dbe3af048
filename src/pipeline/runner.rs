//! The pipeline runner.

use crate::cache::{CacheConfig, ContentCache};
use crate::core::{
    AnalysisContext, AnalysisError, Artifact, ContentHasher, Fingerprint, PipelineResult,
    StageError, StageOutput,
};
use crate::extract::ConfidenceExtractor;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::early_exit::{self, EarlyExit};
use crate::pipeline::metrics::{MetricsRecorder, NoopMetrics, StageOutcome};
use crate::registry::{Stage, StageRegistry, Wave};

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Builder for creating a `PipelineRunner`.
pub struct PipelineRunnerBuilder {
    registry: Option<StageRegistry>,
    cache: Option<ContentCache>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
    extractor: ConfidenceExtractor,
    config: PipelineConfig,
}

impl PipelineRunnerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            registry: None,
            cache: None,
            metrics: None,
            extractor: ConfidenceExtractor::default(),
            config: PipelineConfig::default(),
        }
    }

    /// Sets the stage registry.
    pub fn with_registry(mut self, registry: StageRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shares an existing content cache.
    pub fn with_cache(mut self, cache: ContentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the metrics recorder.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the extractor used for the early-exit check.
    pub fn with_extractor(mut self, extractor: ConfidenceExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the runner.
    pub fn build(self) -> Result<PipelineRunner, AnalysisError> {
        let registry = self
            .registry
            .ok_or_else(|| AnalysisError::configuration("A stage registry is required"))?;
        self.config.validate()?;

        let cache = self.cache.unwrap_or_else(|| {
            ContentCache::new(CacheConfig::default().with_default_ttl(self.config.cache_ttl))
        });

        Ok(PipelineRunner {
            registry,
            cache,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
            extractor: self.extractor,
            config: self.config,
            hasher: ContentHasher::new(),
        })
    }
}

impl Default for PipelineRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage outputs collected during one run.
#[derive(Default)]
struct RunState {
    results: BTreeMap<String, StageOutput>,
    stages_run: Vec<String>,
    attempted: usize,
}

/// Runs the registered stages against artifacts.
///
/// One runner serves any number of concurrent invocations; the content
/// cache is the only state they share.
pub struct PipelineRunner {
    registry: StageRegistry,
    cache: ContentCache,
    metrics: Arc<dyn MetricsRecorder>,
    extractor: ConfidenceExtractor,
    config: PipelineConfig,
    hasher: ContentHasher,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("stages", &self.registry.names())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a new builder.
    pub fn builder() -> PipelineRunnerBuilder {
        PipelineRunnerBuilder::new()
    }

    /// The stage registry.
    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// The content cache.
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// The configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Drops every cached result.
    pub async fn clear_cache(&self) {
        self.cache.invalidate_all().await;
    }

    /// Analyzes an artifact.
    ///
    /// Stage failures and timeouts are absorbed; the stage is simply missing
    /// from the result. Only an unreadable artifact and caller cancellation
    /// (token or deadline) are errors.
    pub async fn run_analysis(
        &self,
        ctx: &AnalysisContext,
        artifact: &Artifact,
    ) -> Result<PipelineResult, AnalysisError> {
        let started = Instant::now();

        let size = artifact.size().await?;
        if size > self.config.max_artifact_size {
            return Err(AnalysisError::ArtifactTooLarge {
                size,
                max: self.config.max_artifact_size,
            });
        }

        let fingerprint = self.hasher.hash_artifact(artifact).await?;

        if let Some(cached) = self.cache.get(&fingerprint).await {
            self.metrics.record_cache_hit();
            let hit = cached.as_cache_hit(started.elapsed());
            tracing::debug!(
                fingerprint = %fingerprint.short(),
                run_id = %hit.id,
                "Cache hit"
            );
            crate::audit::emit_pipeline_completed(&hit, ctx);
            return Ok(hit);
        }
        self.metrics.record_cache_miss();

        ctx.check()?;

        let run_id = uuid::Uuid::new_v4().to_string();
        crate::audit::emit_analysis_started(&run_id, &fingerprint, ctx);
        tracing::info!(
            run_id = %run_id,
            fingerprint = %fingerprint.short(),
            artifact = %artifact.display_name(),
            size_bytes = size,
            "Starting analysis"
        );

        let mut state = RunState::default();

        let remaining = if self.config.early_exit_enabled && self.registry.has_fast_track() {
            let fast = self.registry.plan(Stage::is_fast_track);
            self.run_waves(ctx, artifact, &fingerprint, fast, &mut state)
                .await?;

            let exit = early_exit::evaluate(
                state
                    .stages_run
                    .iter()
                    .filter_map(|name| state.results.get(name).map(|out| (name.as_str(), out))),
                &self.extractor,
                self.config.definitive_threshold,
            );
            if let Some(exit) = exit {
                return Ok(self
                    .finish(ctx, run_id, fingerprint, state, Some(exit), started)
                    .await);
            }
            self.registry.plan(|s| !s.is_fast_track())
        } else {
            self.registry.plan(|_| true)
        };

        self.run_waves(ctx, artifact, &fingerprint, remaining, &mut state)
            .await?;

        Ok(self
            .finish(ctx, run_id, fingerprint, state, None, started)
            .await)
    }

    /// Runs waves one after another, stopping on cancellation.
    async fn run_waves(
        &self,
        ctx: &AnalysisContext,
        artifact: &Artifact,
        fingerprint: &Fingerprint,
        waves: Vec<Wave<'_>>,
        state: &mut RunState,
    ) -> Result<(), AnalysisError> {
        for wave in waves {
            ctx.check()?;

            tracing::debug!(
                fingerprint = %fingerprint.short(),
                priority = wave.priority,
                stages = ?wave.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
                "Running wave"
            );

            let pending: Vec<_> = wave
                .stages
                .iter()
                .map(|stage| self.run_stage(ctx, artifact, fingerprint, stage))
                .collect();
            let outputs: Vec<Option<StageOutput>> = stream::iter(pending)
                .buffered(self.config.max_parallel_stages)
                .try_collect()
                .await?;

            for (stage, output) in wave.stages.iter().zip(outputs) {
                state.attempted += 1;
                if let Some(output) = output {
                    state.results.insert(stage.name().to_string(), output);
                    state.stages_run.push(stage.name().to_string());
                }
            }
        }
        Ok(())
    }

    /// Runs one stage under its timeout.
    ///
    /// `Ok(None)` is a recovered stage failure; `Err` means the caller gave up.
    async fn run_stage(
        &self,
        ctx: &AnalysisContext,
        artifact: &Artifact,
        fingerprint: &Fingerprint,
        stage: &Stage,
    ) -> Result<Option<StageOutput>, AnalysisError> {
        let name = stage.name();

        if artifact.as_path().is_none() && !stage.analyzer().supports_bytes() {
            let error = StageError::UnsupportedInput {
                stage: name.to_string(),
                input: "in-memory",
            };
            self.stage_failed(fingerprint, name, &error, std::time::Duration::ZERO);
            return Ok(None);
        }

        let timeout = ctx.derive_timeout(stage.timeout());
        let started = Instant::now();
        let analysis = AssertUnwindSafe(stage.analyzer().analyze(artifact)).catch_unwind();

        let outcome = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            outcome = tokio::time::timeout(timeout, analysis) => outcome,
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(Ok(output))) => {
                tracing::debug!(
                    fingerprint = %fingerprint.short(),
                    stage = %name,
                    duration_ms = elapsed.as_millis() as u64,
                    "Stage completed"
                );
                self.metrics
                    .record_stage(name, StageOutcome::Completed, elapsed);
                Ok(Some(output))
            }
            Ok(Ok(Err(error))) => {
                self.stage_failed(fingerprint, name, &error, elapsed);
                Ok(None)
            }
            Ok(Err(_panic)) => {
                let error = StageError::failed(name, "analyzer panicked");
                self.stage_failed(fingerprint, name, &error, elapsed);
                Ok(None)
            }
            Err(_) => {
                // A timeout capped by the caller's deadline is the caller's.
                ctx.check()?;
                let error = StageError::timeout(name, timeout);
                self.stage_failed(fingerprint, name, &error, elapsed);
                Ok(None)
            }
        }
    }

    fn stage_failed(
        &self,
        fingerprint: &Fingerprint,
        stage: &str,
        error: &StageError,
        elapsed: std::time::Duration,
    ) {
        tracing::warn!(
            fingerprint = %fingerprint.short(),
            stage = %stage,
            duration_ms = elapsed.as_millis() as u64,
            error = %error,
            "Stage skipped"
        );
        let outcome = if error.is_timeout() {
            StageOutcome::TimedOut
        } else {
            StageOutcome::Failed
        };
        self.metrics.record_stage(stage, outcome, elapsed);
    }

    /// Assembles, caches and reports the result.
    async fn finish(
        &self,
        ctx: &AnalysisContext,
        run_id: String,
        fingerprint: Fingerprint,
        state: RunState,
        exit: Option<EarlyExit>,
        started: Instant,
    ) -> PipelineResult {
        let confidence = match &exit {
            Some(_) => self.config.early_exit_confidence,
            None => {
                let completed = state.stages_run.len() as f64;
                let total = self.registry.len().max(1) as f64;
                0.5 + 0.4 * (completed / total)
            }
        };

        let result = PipelineResult {
            id: run_id,
            fingerprint: fingerprint.clone(),
            results_by_stage: state.results,
            stages_run: state.stages_run,
            stages_attempted: state.attempted,
            early_exit: exit.is_some(),
            cache_hit: false,
            confidence,
            process_time: started.elapsed(),
            completed_at: Utc::now(),
        };

        if let Some(exit) = &exit {
            self.metrics.record_early_exit();
            crate::audit::emit_early_exit(&result, &exit.stage, exit.score);
        }
        self.metrics
            .record_run(result.process_time, result.stages_run.len());

        self.cache
            .set(fingerprint, result.clone(), self.config.cache_ttl)
            .await;

        tracing::info!(
            run_id = %result.id,
            fingerprint = %result.fingerprint.short(),
            stages_run = result.stages_run.len(),
            stages_attempted = result.stages_attempted,
            early_exit = result.early_exit,
            confidence = result.confidence,
            duration_ms = result.process_time.as_millis() as u64,
            "Analysis completed"
        );
        crate::audit::emit_pipeline_completed(&result, ctx);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::MockAnalyzer;
    use crate::core::analyzer_fn;
    use crate::pipeline::PipelineMetrics;
    use crate::registry::StageSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn runner(registry: StageRegistry) -> PipelineRunner {
        PipelineRunner::builder()
            .with_registry(registry)
            .build()
            .unwrap()
    }

    async fn explode(_artifact: Artifact) -> Result<StageOutput, StageError> {
        panic!("boom")
    }

    fn artifact(tag: &str) -> Artifact {
        Artifact::from_bytes(format!("image bytes {tag}").into_bytes())
    }

    #[tokio::test]
    async fn test_requires_registry() {
        let err = PipelineRunner::builder().build().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_stage_failures_are_isolated() {
        let registry = StageRegistry::builder()
            .stage(
                StageSpec::new("ok", 1),
                Arc::new(MockAnalyzer::new("ok", json!({"ai_probability": 0.3}))),
            )
            .stage(
                StageSpec::new("broken", 1),
                Arc::new(MockAnalyzer::failing("broken", "model missing")),
            )
            .stage(
                StageSpec::new("slow", 2).with_timeout(Duration::from_millis(20)),
                Arc::new(
                    MockAnalyzer::new("slow", json!({}))
                        .with_latency(Duration::from_secs(5)),
                ),
            )
            .stage(
                StageSpec::new("panics", 2),
                analyzer_fn("panics", explode),
            )
            .build()
            .unwrap();

        let metrics = Arc::new(PipelineMetrics::new());
        let runner = PipelineRunner::builder()
            .with_registry(registry)
            .with_metrics(metrics.clone())
            .build()
            .unwrap();

        let result = runner
            .run_analysis(&AnalysisContext::new(), &artifact("iso"))
            .await
            .unwrap();
        assert_eq!(result.stages_run, vec!["ok"]);
        assert_eq!(result.stages_attempted, 4);
        assert!(!result.early_exit);
        assert!((result.confidence - 0.6).abs() < 1e-9);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stages_completed, 1);
        assert_eq!(snapshot.stages_failed, 2);
        assert_eq!(snapshot.stages_timed_out, 1);
        assert_eq!(snapshot.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_waves_respect_dependencies_and_declaration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let probe = |name: &'static str, delay: u64| {
            let order = order.clone();
            analyzer_fn(name, move |_a| {
                let order = order.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    order.lock().unwrap().push(name);
                    Ok(json!({"ai_probability": 0.5}))
                }
            })
        };

        let registry = StageRegistry::builder()
            .stage(StageSpec::new("refine", 1).depends_on("base"), probe("refine", 0))
            .stage(StageSpec::new("base", 1), probe("base", 30))
            .stage(StageSpec::new("fast", 1), probe("fast", 0))
            .build()
            .unwrap();

        let result = runner(registry)
            .run_analysis(&AnalysisContext::new(), &artifact("waves"))
            .await
            .unwrap();

        assert_eq!(result.stages_run, vec!["base", "fast", "refine"]);
        let finished = order.lock().unwrap().clone();
        assert_eq!(finished, vec!["fast", "base", "refine"]);
    }

    #[tokio::test]
    async fn test_parallel_stages_in_a_tier() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut builder = StageRegistry::builder();
        for i in 0..6 {
            let (running, peak) = (running.clone(), peak.clone());
            let name = format!("cv-{i}");
            builder = builder.stage(
                StageSpec::new(name.clone(), 3),
                analyzer_fn(name, move |_a| {
                    let (running, peak) = (running.clone(), peak.clone());
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok(json!({}))
                    }
                }),
            );
        }

        let runner = PipelineRunner::builder()
            .with_registry(builder.build().unwrap())
            .with_config(PipelineConfig::default().with_max_parallel_stages(3))
            .build()
            .unwrap();
        let result = runner
            .run_analysis(&AnalysisContext::new(), &artifact("fanout"))
            .await
            .unwrap();

        assert_eq!(result.completed_count(), 6);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak > 1 && peak <= 3, "peak concurrency was {peak}");
    }

    #[tokio::test]
    async fn test_bytes_unsupported_stage_is_skipped() {
        let registry = StageRegistry::builder()
            .stage(
                StageSpec::new("needs-path", 1),
                Arc::new(MockAnalyzer::new("needs-path", json!({})).path_only()),
            )
            .stage(
                StageSpec::new("any", 1),
                Arc::new(MockAnalyzer::new("any", json!({}))),
            )
            .build()
            .unwrap();

        let result = runner(registry)
            .run_analysis(&AnalysisContext::new(), &artifact("bytes"))
            .await
            .unwrap();
        assert_eq!(result.stages_run, vec!["any"]);
        assert_eq!(result.stages_attempted, 2);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_without_result() {
        let registry = StageRegistry::builder()
            .stage(
                StageSpec::new("slow", 1).with_timeout(Duration::from_secs(10)),
                Arc::new(MockAnalyzer::new("slow", json!({})).with_latency(Duration::from_secs(5))),
            )
            .stage(
                StageSpec::new("later", 2),
                Arc::new(MockAnalyzer::new("later", json!({}))),
            )
            .build()
            .unwrap();
        let metrics = Arc::new(PipelineMetrics::new());
        let runner = PipelineRunner::builder()
            .with_registry(registry)
            .with_metrics(metrics.clone())
            .build()
            .unwrap();

        let ctx = AnalysisContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = runner
            .run_analysis(&ctx, &artifact("cancel"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(metrics.snapshot().cache_misses, 1);
        assert_eq!(runner.cache().entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_deadline_is_a_cancellation() {
        let registry = StageRegistry::builder()
            .stage(
                StageSpec::new("slow", 1).with_timeout(Duration::from_secs(10)),
                Arc::new(MockAnalyzer::new("slow", json!({})).with_latency(Duration::from_secs(5))),
            )
            .build()
            .unwrap();

        let ctx = AnalysisContext::new().with_timeout(Duration::from_millis(30));
        let err = runner(registry)
            .run_analysis(&ctx, &artifact("deadline"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DeadlineExceeded { .. }));
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_oversized_artifact_rejected() {
        let registry = StageRegistry::builder()
            .stage(StageSpec::new("any", 1), Arc::new(MockAnalyzer::new("any", json!({}))))
            .build()
            .unwrap();
        let runner = PipelineRunner::builder()
            .with_registry(registry)
            .with_config(PipelineConfig::default().with_max_artifact_size(4))
            .build()
            .unwrap();

        let err = runner
            .run_analysis(&AnalysisContext::new(), &artifact("too big"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ArtifactTooLarge { max: 4, .. }));
    }

    #[tokio::test]
    async fn test_zero_results_is_not_an_error() {
        let registry = StageRegistry::builder()
            .stage(
                StageSpec::new("broken", 1),
                Arc::new(MockAnalyzer::failing("broken", "no gpu")),
            )
            .build()
            .unwrap();
        let result = runner(registry)
            .run_analysis(&AnalysisContext::new(), &artifact("empty"))
            .await
            .unwrap();
        assert!(result.stages_run.is_empty());
        assert_eq!(result.confidence, 0.5);
    }
}
