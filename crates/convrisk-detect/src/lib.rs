//! Risk detection and scoring engine for multi-role conversations
//!
//! Three independent detectors run over one complete conversation and their
//! typed signals are merged deterministically:
//!
//! - [`matcher`]: keyword/category and fine-grained pattern matching with
//!   turn-level evidence
//! - [`semantic`]: a concept/role/turn graph that finds dangerous concept
//!   co-occurrence across the whole conversation
//! - [`multi_role`]: role topology, topic drift, and complementary
//!   information contribution across roles
//!
//! [`engine::Engine`] wires the detectors to an immutable [`Catalog`] and
//! produces one merged [`AnalysisResult`] per call. [`store::ConfigStore`]
//! loads the catalog from human-editable JSON files, materializing built-in
//! defaults when files are missing or corrupt.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use convrisk_core::Turn;
//! use convrisk_detect::{catalog, engine::Engine};
//!
//! let engine = Engine::new(Arc::new(catalog::builtin())).unwrap();
//! let conversation = vec![Turn::new("user", "The weather is nice today")];
//! let result = engine.analyze(&conversation).unwrap();
//! assert!(!result.detected);
//! assert_eq!(result.risk_score, 0);
//! ```
//!
//! [`Catalog`]: convrisk_core::Catalog
//! [`AnalysisResult`]: convrisk_core::AnalysisResult

pub mod catalog;
pub mod engine;
pub mod graph;
pub mod matcher;
pub mod multi_role;
pub mod semantic;
pub mod store;

pub use engine::{Engine, ScoreWeights};
pub use store::ConfigStore;

/// Round to two decimal places, matching the precision of reported scores.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
