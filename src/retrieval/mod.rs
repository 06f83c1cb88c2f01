//! Evidence Retrieval
//!
//! Adversarial multi-query retrieval against the external index,
//! with hybrid semantic/lexical/temporal re-ranking.

pub mod hybrid;
pub mod index;

pub use hybrid::HybridRetriever;
pub use index::{EvidenceIndex, RemoteEvidenceIndex};
