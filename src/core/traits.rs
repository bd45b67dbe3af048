//! Core traits for the evidencefuse library.
//!
//! This module defines the [`Analyzer`] trait every evidence source must
//! implement. The pipeline never inspects how an analyzer works, only this
//! contract.

use crate::core::error::StageError;
use crate::core::input::Artifact;
use crate::core::result::StageOutput;

use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

/// An evidence source run by one pipeline stage.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; stages of a tier run concurrently.
/// - Timeouts are enforced by the runner by dropping the future, so
///   analyzers that spawn child processes should make them die on drop.
/// - Never panic; report failures as [`StageError`].
///
/// # Example Implementation
///
/// ```rust,ignore
/// use evidencefuse::core::{Analyzer, Artifact, StageError, StageOutput};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct NoiseResidual;
///
/// #[async_trait]
/// impl Analyzer for NoiseResidual {
///     fn name(&self) -> &str {
///         "noise-residual"
///     }
///
///     async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError> {
///         // Inspect the image...
///         Ok(serde_json::json!({ "ai_probability": 0.42 }))
///     }
/// }
/// ```
#[async_trait]
pub trait Analyzer: Send + Sync + Debug {
    /// Stable identifier of the analyzer, e.g. "c2pa" or "ai-model".
    fn name(&self) -> &str;

    /// Analyzes the artifact and returns its structured result.
    async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError>;

    /// Whether the analyzer can work on in-memory artifacts.
    ///
    /// Analyzers backed by external tools need a path on disk.
    fn supports_bytes(&self) -> bool {
        true
    }
}

/// A boxed analyzer for type-erased storage.
pub type BoxedAnalyzer = Box<dyn Analyzer>;

/// An arc-wrapped analyzer for shared ownership.
pub type ArcAnalyzer = Arc<dyn Analyzer>;

/// Adapts an async closure into an [`Analyzer`].
pub struct FnAnalyzer<F> {
    name: String,
    func: F,
}

impl<F> FnAnalyzer<F> {
    /// Wraps `func` under the given name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnAnalyzer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAnalyzer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Analyzer for FnAnalyzer<F>
where
    F: Fn(Artifact) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageOutput, StageError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError> {
        (self.func)(artifact.clone()).await
    }
}

/// Builds an [`ArcAnalyzer`] from an async closure.
///
/// ```rust
/// use evidencefuse::core::{analyzer_fn, Analyzer};
///
/// let exif = analyzer_fn("exif", |_artifact| async {
///     Ok(serde_json::json!({ "has_camera_info": true }))
/// });
/// assert_eq!(exif.name(), "exif");
/// ```
pub fn analyzer_fn<F, Fut>(name: impl Into<String>, func: F) -> ArcAnalyzer
where
    F: Fn(Artifact) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StageOutput, StageError>> + Send + 'static,
{
    Arc::new(FnAnalyzer::new(name, func))
}
