//! Core types used throughout the evidencefuse library.
//!
//! This module defines content fingerprints, stage identities, method
//! categories, and the per-invocation [`AnalysisContext`].

use crate::core::error::AnalysisError;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Content fingerprint of an artifact (hex-encoded BLAKE3 digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already hex-encoded digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first 16 hex characters, enough to correlate log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(16);
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", self.0)
    }
}

/// The family of evidence a stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodCategory {
    /// Hand-built computer-vision heuristics (artifacts, lighting, noise...).
    ComputerVision,
    /// Metadata and provenance-certificate forensics.
    MetadataForensics,
    /// Output of a trained classifier.
    AiModel,
}

impl MethodCategory {
    /// All categories, in reporting order.
    pub const ALL: [MethodCategory; 3] = [
        MethodCategory::ComputerVision,
        MethodCategory::MetadataForensics,
        MethodCategory::AiModel,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputerVision => "computer-vision",
            Self::MetadataForensics => "metadata-forensics",
            Self::AiModel => "ai-model",
        }
    }
}

impl fmt::Display for MethodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a stage, used to pick its result shape and category.
///
/// The named variants are the analyzers of the standard catalog. Anything
/// else is `Custom` and goes through the generic extraction probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Fast exiftool pass looking for generator tags.
    MetadataQuick,
    /// C2PA content-credential validation.
    C2pa,
    /// EXIF inspection.
    Exif,
    /// Full metadata dump.
    Metadata,
    /// Generic generation-artifact detector.
    Artifacts,
    /// JPEG/PNG compression forensics.
    Compression,
    /// Pixel-statistics analysis.
    PixelAnalysis,
    /// Color-balance analysis.
    ColorBalance,
    /// Frequency-domain and texture artifacts.
    AdvancedArtifacts,
    /// Object-coherence analysis.
    ObjectCoherence,
    /// Lighting-consistency analysis.
    LightingAnalysis,
    /// Trained classifier ensemble.
    AiModel,
    /// A stage outside the standard catalog.
    Custom(String),
}

impl StageKind {
    /// Resolves a stage name to its identity.
    pub fn from_name(name: &str) -> Self {
        match name {
            "metadata-quick" => Self::MetadataQuick,
            "c2pa" => Self::C2pa,
            "exif" => Self::Exif,
            "metadata" => Self::Metadata,
            "artifacts" => Self::Artifacts,
            "compression" => Self::Compression,
            "pixel-analysis" => Self::PixelAnalysis,
            "color-balance" => Self::ColorBalance,
            "advanced-artifacts" => Self::AdvancedArtifacts,
            "object-coherence" => Self::ObjectCoherence,
            "lighting-analysis" => Self::LightingAnalysis,
            "ai-model" => Self::AiModel,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The canonical stage name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MetadataQuick => "metadata-quick",
            Self::C2pa => "c2pa",
            Self::Exif => "exif",
            Self::Metadata => "metadata",
            Self::Artifacts => "artifacts",
            Self::Compression => "compression",
            Self::PixelAnalysis => "pixel-analysis",
            Self::ColorBalance => "color-balance",
            Self::AdvancedArtifacts => "advanced-artifacts",
            Self::ObjectCoherence => "object-coherence",
            Self::LightingAnalysis => "lighting-analysis",
            Self::AiModel => "ai-model",
            Self::Custom(name) => name,
        }
    }

    /// The evidence family this stage belongs to.
    ///
    /// Custom stages count as computer-vision heuristics.
    pub fn category(&self) -> MethodCategory {
        match self {
            Self::MetadataQuick | Self::C2pa | Self::Exif | Self::Metadata => {
                MethodCategory::MetadataForensics
            }
            Self::AiModel => MethodCategory::AiModel,
            _ => MethodCategory::ComputerVision,
        }
    }

    /// Returns `true` for stages outside the standard catalog.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl FromStr for StageKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation context: correlation data plus the caller's budget.
///
/// The cancellation token and deadline are the parent context every stage
/// timeout is derived from. Cloning the context shares the token.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Request or correlation ID for tracing.
    pub request_id: Option<String>,

    /// Source of the artifact (e.g., "upload", "api").
    pub source: Option<String>,

    /// Additional custom metadata as key-value pairs.
    pub metadata: HashMap<String, String>,

    cancel: CancellationToken,
    deadline: Option<Instant>,
    started_at: Instant,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self {
            request_id: None,
            source: None,
            metadata: HashMap::new(),
            cancel: CancellationToken::new(),
            deadline: None,
            started_at: Instant::now(),
        }
    }
}

impl AnalysisContext {
    /// Creates a context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sets an absolute deadline for the whole invocation.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now. A budget too large to represent
    /// leaves the invocation unbounded.
    pub fn with_timeout(self, budget: Duration) -> Self {
        match Instant::now().checked_add(budget) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns the cancellation token shared by this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the invocation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Caps a stage timeout by the time left in the parent budget.
    pub fn derive_timeout(&self, stage_timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => stage_timeout.min(left),
            None => stage_timeout,
        }
    }

    /// Returns the cancellation error if the caller has given up.
    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(AnalysisError::DeadlineExceeded {
                    elapsed: self.started_at.elapsed(),
                });
            }
        }
        Ok(())
    }

    /// Resolves once the caller gives up, yielding the matching error.
    pub async fn done(&self) -> AnalysisError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => AnalysisError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => AnalysisError::DeadlineExceeded {
                    elapsed: self.started_at.elapsed(),
                },
            },
            None => {
                self.cancel.cancelled().await;
                AnalysisError::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_round_trip_names() {
        for name in [
            "metadata-quick",
            "c2pa",
            "exif",
            "metadata",
            "artifacts",
            "compression",
            "pixel-analysis",
            "color-balance",
            "advanced-artifacts",
            "object-coherence",
            "lighting-analysis",
            "ai-model",
        ] {
            let kind = StageKind::from_name(name);
            assert!(!kind.is_custom(), "{name} should be a catalog stage");
            assert_eq!(kind.as_str(), name);
        }
        assert_eq!(
            StageKind::from_name("noise-residual"),
            StageKind::Custom("noise-residual".into())
        );
    }

    #[test]
    fn test_stage_categories() {
        assert_eq!(StageKind::C2pa.category(), MethodCategory::MetadataForensics);
        assert_eq!(StageKind::MetadataQuick.category(), MethodCategory::MetadataForensics);
        assert_eq!(StageKind::AiModel.category(), MethodCategory::AiModel);
        assert_eq!(StageKind::Compression.category(), MethodCategory::ComputerVision);
        assert_eq!(
            StageKind::Custom("x".into()).category(),
            MethodCategory::ComputerVision
        );
    }

    #[test]
    fn test_fingerprint_short_and_display() {
        let fp = Fingerprint::from_hex("0123456789abcdef0123456789abcdef");
        assert_eq!(fp.short(), "0123456789abcdef");
        assert_eq!(fp.to_string(), "blake3:0123456789abcdef0123456789abcdef");
    }

    #[tokio::test]
    async fn test_context_cancellation() {
        let ctx = AnalysisContext::new().with_request_id("req-1");
        assert!(ctx.check().is_ok());
        ctx.clone().cancel();
        assert!(matches!(ctx.check(), Err(AnalysisError::Cancelled)));
        assert!(matches!(ctx.done().await, AnalysisError::Cancelled));
    }

    #[tokio::test]
    async fn test_context_deadline_caps_stage_timeout() {
        let ctx = AnalysisContext::new().with_timeout(Duration::from_millis(50));
        assert!(ctx.derive_timeout(Duration::from_secs(30)) <= Duration::from_millis(50));
        assert_eq!(
            AnalysisContext::new().derive_timeout(Duration::from_secs(30)),
            Duration::from_secs(30)
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(matches!(
            ctx.check(),
            Err(AnalysisError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn test_unrepresentable_budget_is_unbounded() {
        let ctx = AnalysisContext::new().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.derive_timeout(Duration::from_secs(5)), Duration::from_secs(5));
    }
}
