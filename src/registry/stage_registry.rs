//! The validated, priority-ordered stage registry.

use crate::core::{AnalysisError, ArcAnalyzer};
use crate::registry::catalog::{catalog_spec, standard_catalog};
use crate::registry::stage::{Stage, StageSpec};

use std::collections::{HashMap, HashSet};

/// A group of stages that may run concurrently.
///
/// Waves of one tier run one after another; a stage is placed after every
/// same-tier stage it depends on.
#[derive(Debug, Clone)]
pub struct Wave<'a> {
    /// Tier the wave belongs to.
    pub priority: u32,
    /// Stages of the wave, in declaration order.
    pub stages: Vec<&'a Stage>,
}

/// Immutable, ordered set of stages.
///
/// Stages are sorted by ascending priority; ties keep declaration order.
/// Construction validates the whole table, so a registry that exists is
/// schedulable.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl StageRegistry {
    /// Validates and orders the given stages.
    pub fn new(mut stages: Vec<Stage>) -> Result<Self, AnalysisError> {
        stages.sort_by_key(Stage::priority);
        validate(&stages)?;
        Ok(Self { stages })
    }

    /// Creates a new builder.
    pub fn builder() -> StageRegistryBuilder {
        StageRegistryBuilder::new()
    }

    /// Builds a registry of catalog stages from their analyzers.
    ///
    /// Each analyzer is matched to its catalog entry by name. Catalog stages
    /// without an analyzer are left out.
    pub fn standard<I>(analyzers: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = ArcAnalyzer>,
    {
        let mut by_name: HashMap<String, ArcAnalyzer> = HashMap::new();
        for analyzer in analyzers {
            let name = analyzer.name().to_string();
            if catalog_spec(&name).is_none() {
                return Err(AnalysisError::configuration(format!(
                    "analyzer '{name}' is not a standard catalog stage"
                )));
            }
            if by_name.insert(name.clone(), analyzer).is_some() {
                return Err(AnalysisError::configuration(format!(
                    "duplicate analyzer '{name}'"
                )));
            }
        }

        let stages = standard_catalog()
            .into_iter()
            .filter_map(|spec| {
                by_name
                    .remove(&spec.name)
                    .map(|analyzer| Stage::new(spec, analyzer))
            })
            .collect();
        Self::new(stages)
    }

    /// All stages in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no stage is registered.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Looks up a stage by name.
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    /// Fast-track stages in execution order.
    pub fn fast_track(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.is_fast_track())
    }

    /// Returns `true` if any stage is fast-track.
    pub fn has_fast_track(&self) -> bool {
        self.stages.iter().any(Stage::is_fast_track)
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Plans the selected stages into ordered waves.
    ///
    /// Dependencies on stages outside the selection are treated as already
    /// satisfied.
    pub fn plan<F>(&self, include: F) -> Vec<Wave<'_>>
    where
        F: Fn(&Stage) -> bool,
    {
        let selected: Vec<&Stage> = self.stages.iter().filter(|s| include(s)).collect();

        let mut plan = Vec::new();
        for tier in selected.chunk_by(|a, b| a.priority() == b.priority()) {
            let priority = tier[0].priority();
            // Validation rules out cycles, so the fallback only keeps the
            // plan total.
            let waves = tier_waves(tier).unwrap_or_else(|| tier.iter().map(|s| vec![*s]).collect());
            plan.extend(waves.into_iter().map(|stages| Wave { priority, stages }));
        }
        plan
    }
}

/// Layers one tier by its in-tier dependencies. `None` on a cycle.
fn tier_waves<'a>(tier: &[&'a Stage]) -> Option<Vec<Vec<&'a Stage>>> {
    let in_tier: HashSet<&str> = tier.iter().map(|s| s.name()).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut remaining: Vec<&'a Stage> = tier.to_vec();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&'a Stage>, Vec<&'a Stage>) =
            remaining.into_iter().partition(|s| {
                s.dependencies()
                    .iter()
                    .all(|d| !in_tier.contains(d.as_str()) || placed.contains(d.as_str()))
            });
        if ready.is_empty() {
            return None;
        }
        placed.extend(ready.iter().map(|s| s.name()));
        waves.push(ready);
        remaining = blocked;
    }
    Some(waves)
}

fn validate(stages: &[Stage]) -> Result<(), AnalysisError> {
    if stages.is_empty() {
        return Err(AnalysisError::configuration("stage registry is empty"));
    }

    let mut by_name: HashMap<&str, &Stage> = HashMap::new();
    for stage in stages {
        if stage.name().trim().is_empty() {
            return Err(AnalysisError::configuration("stage name must not be empty"));
        }
        if stage.timeout().is_zero() {
            return Err(AnalysisError::configuration(format!(
                "stage '{}' has a zero timeout",
                stage.name()
            )));
        }
        if by_name.insert(stage.name(), stage).is_some() {
            return Err(AnalysisError::configuration(format!(
                "duplicate stage '{}'",
                stage.name()
            )));
        }
    }

    if let Some(first_full) = stages.iter().find(|s| !s.is_fast_track()) {
        if let Some(late) = stages
            .iter()
            .find(|s| s.is_fast_track() && s.priority() > first_full.priority())
        {
            return Err(AnalysisError::configuration(format!(
                "fast-track stage '{}' (priority {}) is ranked after non-fast-track stage '{}' (priority {})",
                late.name(),
                late.priority(),
                first_full.name(),
                first_full.priority()
            )));
        }
    }

    for stage in stages {
        for dep in stage.dependencies() {
            let Some(target) = by_name.get(dep.as_str()) else {
                return Err(AnalysisError::configuration(format!(
                    "stage '{}' depends on unknown stage '{dep}'",
                    stage.name()
                )));
            };
            if target.priority() > stage.priority() {
                return Err(AnalysisError::configuration(format!(
                    "stage '{}' depends on '{dep}', which runs in a later tier",
                    stage.name()
                )));
            }
            if stage.is_fast_track() && !target.is_fast_track() {
                return Err(AnalysisError::configuration(format!(
                    "fast-track stage '{}' depends on non-fast-track stage '{dep}'",
                    stage.name()
                )));
            }
        }
    }

    let all: Vec<&Stage> = stages.iter().collect();
    for tier in all.chunk_by(|a, b| a.priority() == b.priority()) {
        if tier_waves(tier).is_none() {
            return Err(AnalysisError::configuration(format!(
                "dependency cycle among priority {} stages",
                tier[0].priority()
            )));
        }
    }

    Ok(())
}

/// Builder for [`StageRegistry`].
#[derive(Debug, Default)]
pub struct StageRegistryBuilder {
    stages: Vec<Stage>,
    unknown: Vec<String>,
}

impl StageRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage.
    pub fn stage(mut self, spec: StageSpec, analyzer: ArcAnalyzer) -> Self {
        self.stages.push(Stage::new(spec, analyzer));
        self
    }

    /// Adds a catalog stage, using the analyzer's name to find its spec.
    pub fn catalog_stage(mut self, analyzer: ArcAnalyzer) -> Self {
        match catalog_spec(analyzer.name()) {
            Some(spec) => self.stages.push(Stage::new(spec, analyzer)),
            None => self.unknown.push(analyzer.name().to_string()),
        }
        self
    }

    /// Validates and builds the registry.
    pub fn build(self) -> Result<StageRegistry, AnalysisError> {
        if let Some(name) = self.unknown.first() {
            return Err(AnalysisError::configuration(format!(
                "analyzer '{name}' is not a standard catalog stage"
            )));
        }
        StageRegistry::new(self.stages)
    }
}
