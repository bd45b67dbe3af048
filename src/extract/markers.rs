//! Detection of generative-tool names in metadata.

use serde_json::Value;

/// Tool names and provenance tags that identify generated content.
pub const DEFAULT_GENERATIVE_MARKERS: &[&str] = &[
    "ChatGPT",
    "DALL-E",
    "Midjourney",
    "Stable Diffusion",
    "trainedAlgorithmicMedia",
    "AI generated",
];

/// Case-insensitive matcher for generative-tool markers in metadata values.
#[derive(Debug, Clone)]
pub struct GenerativeMarkers {
    /// Original spelling, for reporting.
    markers: Vec<String>,
    /// Lowercased copies, for matching.
    lowered: Vec<String>,
}

impl Default for GenerativeMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATIVE_MARKERS.iter().copied())
    }
}

impl GenerativeMarkers {
    /// Creates a matcher over the given markers.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers: Vec<String> = markers
            .into_iter()
            .map(Into::into)
            .filter(|m| !m.trim().is_empty())
            .collect();
        let lowered = markers.iter().map(|m| m.to_lowercase()).collect();
        Self { markers, lowered }
    }

    /// The configured markers.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Returns the first marker contained in `text`.
    pub fn find_in_str(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.lowered
            .iter()
            .position(|m| text.contains(m.as_str()))
            .map(|i| self.markers[i].as_str())
    }

    /// Searches every string in a JSON document, depth-first.
    pub fn find_in(&self, value: &Value) -> Option<&str> {
        match value {
            Value::String(s) => self.find_in_str(s),
            Value::Array(items) => items.iter().find_map(|v| self.find_in(v)),
            Value::Object(map) => map.values().find_map(|v| self.find_in(v)),
            _ => None,
        }
    }
}
