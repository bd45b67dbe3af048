//! Early-exit evaluation over fast-track results.

use crate::core::{MethodCategory, StageKind, StageOutput};
use crate::extract::ConfidenceExtractor;

/// The evidence that ended a run early.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyExit {
    /// Stage whose result was definitive.
    pub stage: String,
    /// Its extracted score.
    pub score: f64,
}

/// Returns the first metadata-forensics result scoring at or above
/// `threshold`, scanning in execution order.
pub fn evaluate<'a, I>(
    results: I,
    extractor: &ConfidenceExtractor,
    threshold: f64,
) -> Option<EarlyExit>
where
    I: IntoIterator<Item = (&'a str, &'a StageOutput)>,
{
    results.into_iter().find_map(|(stage, output)| {
        if StageKind::from_name(stage).category() != MethodCategory::MetadataForensics {
            return None;
        }
        let score = extractor.extract(stage, output).score()?;
        (score >= threshold).then(|| EarlyExit {
            stage: stage.to_string(),
            score,
        })
    })
}
