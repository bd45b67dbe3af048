//! The standard stage catalog.

use crate::registry::stage::StageSpec;

use std::time::Duration;

/// Specs of the twelve standard analyzers, in declaration order.
///
/// Tier 1 holds the cheap provenance checks, all fast-track. The trained
/// classifier shares tier 2 with the full metadata dump; the heavier
/// computer-vision passes follow.
pub fn standard_catalog() -> Vec<StageSpec> {
    let secs = Duration::from_secs;
    vec![
        StageSpec::new("metadata-quick", 1).fast_track().with_timeout(secs(5)),
        StageSpec::new("c2pa", 1).fast_track().with_timeout(secs(8)),
        StageSpec::new("exif", 1).fast_track().with_timeout(secs(2)),
        StageSpec::new("metadata", 2).with_timeout(secs(8)),
        StageSpec::new("ai-model", 2).with_timeout(secs(30)),
        StageSpec::new("artifacts", 3).with_timeout(secs(15)),
        StageSpec::new("compression", 3).with_timeout(secs(10)),
        StageSpec::new("pixel-analysis", 3).with_timeout(secs(18)),
        StageSpec::new("color-balance", 3).with_timeout(secs(12)),
        StageSpec::new("advanced-artifacts", 3).with_timeout(secs(20)),
        StageSpec::new("object-coherence", 4).with_timeout(secs(25)),
        StageSpec::new("lighting-analysis", 4).with_timeout(secs(20)),
    ]
}

/// Looks up a catalog spec by stage name.
pub fn catalog_spec(name: &str) -> Option<StageSpec> {
    standard_catalog().into_iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MethodCategory;

    #[test]
    fn test_catalog_layout() {
        let catalog = standard_catalog();
        assert_eq!(catalog.len(), 12);
        let fast: Vec<&str> = catalog
            .iter()
            .filter(|s| s.fast_track)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(fast, vec!["metadata-quick", "c2pa", "exif"]);
        assert!(catalog.iter().all(|s| !s.kind().is_custom()));
    }

    #[test]
    fn test_fast_track_stages_are_metadata_forensics() {
        for spec in standard_catalog().into_iter().filter(|s| s.fast_track) {
            assert_eq!(spec.kind().category(), MethodCategory::MetadataForensics);
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let spec = catalog_spec("ai-model").unwrap();
        assert_eq!(spec.priority, 2);
        assert_eq!(spec.timeout, Duration::from_secs(30));
        assert!(catalog_spec("noise-residual").is_none());
    }
}
