//! Evidence candidates returned by retrieval

use serde::{Deserialize, Serialize};

/// A verbatim excerpt surfaced for one claim.
///
/// Never mutated after creation; deduplicated by exact text within a
/// claim's retrieval round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    /// Verbatim excerpt text from the source novel
    pub text: String,
    /// Semantic similarity reported by the index, in [0, 1]
    pub semantic_score: f32,
    /// Raw lexical overlap score; normalized later against the re-ranking window
    #[serde(default)]
    pub lexical_score: f32,
    /// Character offset into the source, when the index carries it
    #[serde(default)]
    pub position: Option<u64>,
    /// Identifier of the source document, when known
    #[serde(default)]
    pub source_id: Option<String>,
}

impl EvidenceCandidate {
    pub fn new(text: impl Into<String>, semantic_score: f32) -> Self {
        Self {
            text: text.into(),
            semantic_score,
            lexical_score: 0.0,
            position: None,
            source_id: None,
        }
    }
}
