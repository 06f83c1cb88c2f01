//! Narrative Backstory Verifier
//!
//! Judges whether a character backstory is logically consistent with a
//! long reference novel:
//! - Hybrid adversarial evidence retrieval (semantic + lexical + positional)
//! - Confidence-gated relation classification per claim
//! - Causal aggregation with asymmetric contradiction weighting
//! - Verbatim evidence dossiers with fixed-format rationales

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod retrieval;
pub mod utils;
pub mod verdict;

// Re-exports for convenience
pub use classify::ClaimDecisionEngine;
pub use config::VerifierConfig;
pub use pipeline::StoryPipeline;
pub use retrieval::HybridRetriever;
pub use verdict::{CausalAggregator, DossierBuilder};
