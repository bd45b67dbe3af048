//! Core types and traits for the evidencefuse library.
//!
//! - [`types`] - Fingerprints, stage identities, categories, invocation context
//! - [`traits`] - The `Analyzer` trait
//! - [`error`] - Structured error types
//! - [`input`] - Artifact abstraction
//! - [`hasher`] - BLAKE3 content fingerprinting
//! - [`result`] - The pipeline result structure

pub mod error;
pub mod hasher;
pub mod input;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{
    AnalysisError, AnalysisResult, ScoringConfigError, StageError, StageResult,
};
pub use hasher::ContentHasher;
pub use input::Artifact;
pub use result::{PipelineResult, StageOutput};
pub use traits::{analyzer_fn, Analyzer, ArcAnalyzer, BoxedAnalyzer, FnAnalyzer};
pub use types::{AnalysisContext, Fingerprint, MethodCategory, StageKind};
