//! Confidence extraction.
//!
//! Turns each analyzer's opaque result into a [`Signal`]: a probability in
//! [0, 1] that the artifact is synthetic, or `NoSignal`.
//!
//! - [`signal`] - The `Signal` type
//! - [`shapes`] - Typed layouts of the catalog analyzers' results
//! - [`markers`] - Generative-tool name matching for metadata
//! - [`extractor`] - The stage-aware `ConfidenceExtractor`

pub mod extractor;
pub mod markers;
pub mod shapes;
pub mod signal;

pub use extractor::ConfidenceExtractor;
pub use markers::{GenerativeMarkers, DEFAULT_GENERATIVE_MARKERS};
pub use shapes::{probe_generic, ResultShape};
pub use signal::Signal;
