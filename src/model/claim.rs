//! Claim types produced by the extraction stage

use serde::{Deserialize, Serialize};

/// Narrative weight of a claim within its backstory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    /// Load-bearing: falsifying this claim invalidates the whole backstory
    Core,
    /// Peripheral color; contributes to cumulative scoring only
    #[default]
    Detail,
}

/// One atomic, checkable assertion extracted from a backstory.
///
/// Immutable once created; belongs to exactly one story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier (`{story_id}_c{index}` for extracted claims)
    pub id: String,
    /// The story this claim was extracted from
    pub story_id: String,
    /// The assertion itself
    pub text: String,
    /// Rough category reported by the extractor (event, belief, ...)
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub importance: Importance,
    /// Falsifying rephrasings used to surface contradicting passages
    #[serde(default)]
    pub adversarial_queries: Vec<String>,
}

impl Claim {
    pub fn new(id: impl Into<String>, story_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            story_id: story_id.into(),
            text: text.into(),
            kind: None,
            importance: Importance::Detail,
            adversarial_queries: Vec::new(),
        }
    }

    /// Claim text plus all adversarial queries, issue order preserved.
    pub fn query_set(&self) -> Vec<&str> {
        std::iter::once(self.text.as_str())
            .chain(self.adversarial_queries.iter().map(|q| q.as_str()))
            .collect()
    }
}
