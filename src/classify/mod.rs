//! Relation Classification
//!
//! The classifier boundary plus the confidence-gated decision policy
//! around it.

pub mod classifier;
pub mod engine;

pub use classifier::{RelationClassifier, RelationSignals, RemoteNliClassifier};
pub use engine::ClaimDecisionEngine;
