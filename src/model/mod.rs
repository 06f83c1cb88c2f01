//! Shared Data Model
//!
//! Claims, evidence candidates, relation judgments, dossier entries,
//! and the terminal per-story verdict.

pub mod claim;
pub mod decision;
pub mod evidence;

pub use claim::{Claim, Importance};
pub use decision::{ClaimDecision, DossierEntry, RelationJudgment, RelationLabel, StoryResult};
pub use evidence::EvidenceCandidate;
