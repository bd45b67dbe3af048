//! Structured audit logging.
//!
//! This module provides functions for emitting structured audit events
//! using the `tracing` crate on the `evidencefuse::audit` target. Events can
//! be captured by any tracing subscriber (JSON file, OpenTelemetry, etc.).

mod events;

pub use events::{
    emit_analysis_started, emit_early_exit, emit_pipeline_completed, emit_verdict, AuditEvent,
    PipelineAuditEvent, VerdictAuditEvent,
};
