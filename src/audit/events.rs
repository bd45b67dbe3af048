//! Audit event types and emission functions.

use crate::core::{AnalysisContext, Fingerprint, PipelineResult};
use crate::verdict::Verdict;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a finished pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Run ID.
    pub run_id: String,

    /// Content fingerprint (BLAKE3).
    pub fingerprint: String,

    /// Stages that produced a result, in execution order.
    pub stages_run: Vec<String>,

    /// Stages attempted.
    pub stages_attempted: usize,

    /// Whether the run ended early.
    pub early_exit: bool,

    /// Whether the result came from the cache.
    pub cache_hit: bool,

    /// Coverage confidence.
    pub confidence: f64,

    /// Processing time in milliseconds.
    pub duration_ms: u64,

    /// Request ID, if available.
    pub request_id: Option<String>,
}

impl PipelineAuditEvent {
    /// Builds the event for a result.
    pub fn new(result: &PipelineResult, context: &AnalysisContext) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id: result.id.clone(),
            fingerprint: result.fingerprint.as_str().to_string(),
            stages_run: result.stages_run.clone(),
            stages_attempted: result.stages_attempted,
            early_exit: result.early_exit,
            cache_hit: result.cache_hit,
            confidence: result.confidence,
            duration_ms: result.process_time.as_millis() as u64,
            request_id: context.request_id.clone(),
        }
    }
}

impl AuditEvent for PipelineAuditEvent {
    fn event_type(&self) -> &'static str {
        "pipeline_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit event for a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Run the verdict was computed from.
    pub run_id: String,

    /// Content fingerprint (BLAKE3).
    pub fingerprint: String,

    /// Verdict label.
    pub label: String,

    /// Final score in percent, if any.
    pub probability_percent: Option<f64>,

    /// Verdict confidence.
    pub confidence: f64,

    /// Stage that decided the verdict on its own, if any.
    pub definitive_stage: Option<String>,

    /// Number of scored methods.
    pub scored_methods: usize,

    /// Scoring table version.
    pub config_version: u32,
}

impl VerdictAuditEvent {
    /// Builds the event for a verdict.
    pub fn new(result: &PipelineResult, verdict: &Verdict) -> Self {
        Self {
            timestamp: verdict.created_at,
            run_id: result.id.clone(),
            fingerprint: result.fingerprint.as_str().to_string(),
            label: verdict.label.as_str().to_string(),
            probability_percent: verdict.probability_percent,
            confidence: verdict.confidence,
            definitive_stage: verdict.definitive_stage.clone(),
            scored_methods: verdict.scored_methods(),
            config_version: verdict.config_version,
        }
    }
}

impl AuditEvent for VerdictAuditEvent {
    fn event_type(&self) -> &'static str {
        "verdict"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a run starting.
pub fn emit_analysis_started(run_id: &str, fingerprint: &Fingerprint, context: &AnalysisContext) {
    tracing::info!(
        target: "evidencefuse::audit",
        event_type = "analysis_started",
        run_id = %run_id,
        fingerprint = %fingerprint,
        request_id = ?context.request_id,
        source = ?context.source,
        "Analysis started"
    );
}

/// Emits an audit event for a finished run.
pub fn emit_pipeline_completed(result: &PipelineResult, context: &AnalysisContext) {
    let event = PipelineAuditEvent::new(result, context);
    tracing::info!(
        target: "evidencefuse::audit",
        event_type = event.event_type(),
        run_id = %event.run_id,
        fingerprint = %event.fingerprint,
        stages_run = ?event.stages_run,
        stages_attempted = event.stages_attempted,
        early_exit = event.early_exit,
        cache_hit = event.cache_hit,
        confidence = event.confidence,
        duration_ms = event.duration_ms,
        request_id = ?event.request_id,
        "Pipeline completed"
    );
}

/// Emits an audit event for a run ended by definitive evidence.
pub fn emit_early_exit(result: &PipelineResult, stage: &str, score: f64) {
    tracing::info!(
        target: "evidencefuse::audit",
        event_type = "early_exit",
        run_id = %result.id,
        fingerprint = %result.fingerprint,
        stage = %stage,
        score = score,
        "Definitive evidence ended analysis early"
    );
}

/// Emits an audit event for a verdict.
pub fn emit_verdict(result: &PipelineResult, verdict: &Verdict) {
    let event = VerdictAuditEvent::new(result, verdict);
    tracing::info!(
        target: "evidencefuse::audit",
        event_type = event.event_type(),
        run_id = %event.run_id,
        fingerprint = %event.fingerprint,
        label = %event.label,
        probability_percent = ?event.probability_percent,
        confidence = event.confidence,
        definitive_stage = ?event.definitive_stage,
        scored_methods = event.scored_methods,
        config_version = event.config_version,
        "Verdict issued"
    );
}
