//! # Evidencefuse
//!
//! A staged evidence-fusion pipeline for deciding whether an image was
//! produced by a generative model.
//!
//! ## Overview
//!
//! Evidencefuse runs a set of heterogeneous analyzers over an artifact and
//! fuses their outputs into a single verdict, allowing you to:
//!
//! - Register analyzers as prioritized stages with timeouts and dependencies
//! - Short-circuit on definitive metadata evidence (content credentials,
//!   generator names in metadata)
//! - Serve repeat content from a content-addressed cache
//! - Normalize analyzer outputs of many shapes into scores
//! - Fuse scores with a versioned, calibrated scoring table
//! - Emit structured audit events for every run and verdict
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evidencefuse::analyzers::MockAnalyzer;
//! use evidencefuse::{AnalysisContext, Artifact, PipelineRunner, StageRegistry, VerdictAggregator};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Register analyzers under catalog stage names
//!     let registry = StageRegistry::builder()
//!         .catalog_stage(Arc::new(MockAnalyzer::new("exif", json!({ "Make": "Canon" }))))
//!         .catalog_stage(Arc::new(MockAnalyzer::new(
//!             "color-balance",
//!             json!({ "ai_color_score": 0.2 }),
//!         )))
//!         .build()?;
//!
//!     let runner = PipelineRunner::builder().with_registry(registry).build()?;
//!
//!     let artifact = Artifact::from_path("photo.jpg");
//!     let result = runner.run_analysis(&AnalysisContext::new(), &artifact).await?;
//!
//!     let verdict = VerdictAggregator::new().aggregate(&result);
//!     println!("{}", verdict.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the `command` feature
//! - `command` - [`CommandAnalyzer`](analyzers::CommandAnalyzer) for external programs
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Artifacts, contexts, fingerprints, errors and the `Analyzer` trait
//! - **Registry**: Stage declarations and execution planning
//! - **Pipeline**: Staged execution with early exit, timeouts and cancellation
//! - **Cache**: Content-addressed result cache with per-entry TTL
//! - **Extract**: Normalization of analyzer outputs into signals
//! - **Verdict**: Calibration, weighting, boosting and label mapping
//! - **Audit**: Structured logging for runs and verdicts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod analyzers;
pub mod audit;
pub mod cache;
pub mod core;
pub mod extract;
pub mod pipeline;
pub mod registry;
pub mod verdict;

// Re-export commonly used types at the crate root
pub use crate::core::{
    analyzer_fn, AnalysisContext, AnalysisError, Analyzer, Artifact, ContentHasher, Fingerprint,
    MethodCategory, PipelineResult, StageError, StageKind, StageOutput,
};

pub use crate::cache::{CacheConfig, ContentCache};
pub use crate::extract::{ConfidenceExtractor, Signal};
pub use crate::pipeline::{MetricsRecorder, PipelineConfig, PipelineMetrics, PipelineRunner};
pub use crate::registry::{Stage, StageRegistry, StageSpec};
pub use crate::verdict::{ScoringConfig, Verdict, VerdictAggregator, VerdictLabel};

/// Prelude module for convenient imports.
///
/// ```rust
/// use evidencefuse::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        analyzer_fn, AnalysisContext, AnalysisError, Analyzer, Artifact, Fingerprint,
        PipelineResult, StageError, StageOutput,
    };
    pub use crate::cache::{CacheConfig, ContentCache};
    pub use crate::extract::{ConfidenceExtractor, Signal};
    pub use crate::pipeline::{PipelineConfig, PipelineMetrics, PipelineRunner};
    pub use crate::registry::{StageRegistry, StageSpec};
    pub use crate::verdict::{ScoringConfig, Verdict, VerdictAggregator, VerdictLabel};
}
