//! Analyzer implementations.
//!
//! This module contains implementations of the [`Analyzer`](crate::core::Analyzer)
//! trait that ship with the crate.
//!
//! ## Available Analyzers
//!
//! - [`MockAnalyzer`] - fixed outputs, latency and failures for testing
//! - [`CommandAnalyzer`] - runs an external program (requires `command` feature)
//!
//! ## Implementing a Custom Analyzer
//!
//! Any detector can take part in the pipeline by implementing `Analyzer`:
//!
//! ```rust
//! use evidencefuse::core::{Analyzer, Artifact, StageError, StageOutput};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct NoiseResidual;
//!
//! #[async_trait]
//! impl Analyzer for NoiseResidual {
//!     fn name(&self) -> &str {
//!         "noise-residual"
//!     }
//!
//!     async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError> {
//!         let len = artifact.size_hint().unwrap_or(0);
//!         Ok(serde_json::json!({ "ai_probability": if len > 0 { 0.2 } else { 0.0 } }))
//!     }
//! }
//! ```
//!
//! Closures work too, see [`analyzer_fn`](crate::core::analyzer_fn).

#[cfg(feature = "command")]
mod command;
mod mock;

#[cfg(feature = "command")]
pub use command::CommandAnalyzer;
pub use mock::MockAnalyzer;
