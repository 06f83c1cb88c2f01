//! Verdict Assembly
//!
//! Causal aggregation of per-claim decisions into a story verdict,
//! plus dossier persistence and rationale rendering.

pub mod aggregate;
pub mod dossier;

pub use aggregate::CausalAggregator;
pub use dossier::{render_rationale, DossierBuilder, StoryDossier};
