//! Stage definitions.

use crate::core::{ArcAnalyzer, MethodCategory, StageKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Scheduling attributes of a stage, independent of its analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Unique stage name. Also selects the result shape.
    pub name: String,

    /// Tier; lower runs first.
    pub priority: u32,

    /// Whether the stage runs before the early-exit check.
    pub fast_track: bool,

    /// Upper bound on one analyzer call.
    #[serde(with = "crate::core::result::duration_serde")]
    pub timeout: Duration,

    /// Stages that must run before this one.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl StageSpec {
    /// Creates a non-fast-track spec with a 10 second timeout.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            fast_track: false,
            timeout: Duration::from_secs(10),
            dependencies: BTreeSet::new(),
        }
    }

    /// Marks the stage as fast-track.
    pub fn fast_track(mut self) -> Self {
        self.fast_track = true;
        self
    }

    /// Sets the fast-track flag.
    pub fn with_fast_track(mut self, fast_track: bool) -> Self {
        self.fast_track = fast_track;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a dependency.
    pub fn depends_on(mut self, stage: impl Into<String>) -> Self {
        self.dependencies.insert(stage.into());
        self
    }

    /// The stage identity derived from the name.
    pub fn kind(&self) -> StageKind {
        StageKind::from_name(&self.name)
    }
}

/// A stage: scheduling attributes plus the analyzer that runs it.
#[derive(Clone)]
pub struct Stage {
    spec: StageSpec,
    kind: StageKind,
    analyzer: ArcAnalyzer,
}

impl Stage {
    /// Binds an analyzer to a spec.
    pub fn new(spec: StageSpec, analyzer: ArcAnalyzer) -> Self {
        let kind = spec.kind();
        Self {
            spec,
            kind,
            analyzer,
        }
    }

    /// The stage name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The stage tier.
    pub fn priority(&self) -> u32 {
        self.spec.priority
    }

    /// Whether the stage is fast-track.
    pub fn is_fast_track(&self) -> bool {
        self.spec.fast_track
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.spec.timeout
    }

    /// Names of stages that run before this one.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.spec.dependencies
    }

    /// The stage identity.
    pub fn kind(&self) -> &StageKind {
        &self.kind
    }

    /// The evidence family.
    pub fn category(&self) -> MethodCategory {
        self.kind.category()
    }

    /// The scheduling attributes.
    pub fn spec(&self) -> &StageSpec {
        &self.spec
    }

    /// The analyzer.
    pub fn analyzer(&self) -> &ArcAnalyzer {
        &self.analyzer
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.spec.name)
            .field("priority", &self.spec.priority)
            .field("fast_track", &self.spec.fast_track)
            .field("timeout", &self.spec.timeout)
            .field("dependencies", &self.spec.dependencies)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}
