//! Stage registry.
//!
//! A fixed, validated catalog of analyzer stages: name, priority tier,
//! fast-track flag, timeout and dependencies. Built once at startup and
//! never mutated.
//!
//! # Example
//!
//! ```rust
//! use evidencefuse::core::analyzer_fn;
//! use evidencefuse::registry::{StageRegistry, StageSpec};
//! use std::time::Duration;
//!
//! let registry = StageRegistry::builder()
//!     .catalog_stage(analyzer_fn("c2pa", |_a| async { Ok(serde_json::json!({"score": 0})) }))
//!     .stage(
//!         StageSpec::new("noise-residual", 3).with_timeout(Duration::from_secs(5)),
//!         analyzer_fn("noise-residual", |_a| async { Ok(serde_json::json!({"ai_probability": 0.2})) }),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.names(), vec!["c2pa", "noise-residual"]);
//! ```

pub mod catalog;
pub mod stage;
pub mod stage_registry;

pub use catalog::{catalog_spec, standard_catalog};
pub use stage::{Stage, StageSpec};
pub use stage_registry::{StageRegistry, StageRegistryBuilder, Wave};
