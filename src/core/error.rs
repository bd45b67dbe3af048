//! Error types for the evidencefuse library.
//!
//! Errors are split by blast radius. [`AnalysisError`] aborts a whole
//! pipeline invocation. [`StageError`] is what a single analyzer returns.
//! The runner recovers it locally, so it never escapes `run_analysis`.
//! [`ScoringConfigError`] covers invalid scoring tables.

use std::time::Duration;
use thiserror::Error;

/// Fatal errors for a pipeline invocation.
///
/// Only three things end a run early: the artifact cannot be read, the
/// caller gave up (cancellation or deadline), or the pipeline was built
/// with an invalid configuration.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The artifact does not exist.
    #[error("artifact not found: {path}")]
    ArtifactNotFound {
        /// Path that was not found.
        path: String,
    },

    /// The artifact exists but could not be read for fingerprinting.
    #[error("failed to read artifact '{path}': {source}")]
    ArtifactRead {
        /// Path of the artifact.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact exceeds the configured size limit.
    #[error("artifact size {size} bytes exceeds maximum {max} bytes")]
    ArtifactTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        max: u64,
    },

    /// The caller cancelled the invocation.
    #[error("analysis was cancelled")]
    Cancelled,

    /// The caller's deadline passed before the pipeline finished.
    #[error("analysis deadline exceeded after {elapsed:?}")]
    DeadlineExceeded {
        /// Time spent in the pipeline before the deadline fired.
        elapsed: Duration,
    },

    /// The pipeline or registry configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AnalysisError {
    /// Returns `true` if the caller gave up, as opposed to the pipeline failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }

    /// Returns `true` if the artifact itself could not be used.
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. } | Self::ArtifactRead { .. } | Self::ArtifactTooLarge { .. }
        )
    }

    /// Maps an I/O error on `path` to the matching artifact error.
    pub fn artifact_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::ArtifactNotFound { path }
        } else {
            Self::ArtifactRead { path, source }
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Failure of a single analyzer stage.
///
/// Stage failures are non-fatal. The runner logs them and the stage is
/// simply absent from the pipeline result.
#[derive(Debug, Error)]
pub enum StageError {
    /// The analyzer ran and reported a failure.
    #[error("stage '{stage}' failed: {message}")]
    Failed {
        /// Name of the stage.
        stage: String,
        /// Error message from the analyzer.
        message: String,
    },

    /// The analyzer did not finish within its timeout.
    #[error("stage '{stage}' timed out after {elapsed:?}")]
    Timeout {
        /// Name of the stage.
        stage: String,
        /// Timeout that elapsed.
        elapsed: Duration,
    },

    /// The analyzer produced output that could not be parsed.
    #[error("stage '{stage}' produced malformed output: {details}")]
    MalformedOutput {
        /// Name of the stage.
        stage: String,
        /// Parser details.
        details: String,
    },

    /// The analyzer cannot handle this kind of artifact input.
    #[error("stage '{stage}' does not support {input} input")]
    UnsupportedInput {
        /// Name of the stage.
        stage: String,
        /// Kind of input that was rejected.
        input: &'static str,
    },

    /// An I/O error occurred inside the analyzer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Returns `true` if the stage ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the stage name if this error carries one.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Failed { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::MalformedOutput { stage, .. }
            | Self::UnsupportedInput { stage, .. } => Some(stage),
            Self::Io(_) => None,
        }
    }

    /// Creates a `Failed` error.
    pub fn failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(stage: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            stage: stage.into(),
            elapsed,
        }
    }

    /// Creates a `MalformedOutput` error.
    pub fn malformed(stage: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedOutput {
            stage: stage.into(),
            details: details.into(),
        }
    }
}

/// Errors for loading or validating a scoring table.
#[derive(Debug, Error)]
pub enum ScoringConfigError {
    /// The table failed validation.
    #[error("invalid scoring table (version {version}): {reason}")]
    Invalid {
        /// Version of the offending table.
        version: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// The table could not be parsed.
    #[error("failed to parse scoring table: {0}")]
    Parse(#[from] serde_json::Error),

    /// The table file could not be read.
    #[error("failed to read scoring table: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for pipeline invocations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A specialized `Result` type for analyzer stages.
pub type StageResult<T> = Result<T, StageError>;
