//! Content-addressed result cache.
//!
//! Results are keyed by the BLAKE3 fingerprint of the artifact bytes, so the
//! same content under another name or path is a hit.

pub mod config;
pub mod store;

pub use config::CacheConfig;
pub use store::{CacheStats, ContentCache, MAX_TTL};
