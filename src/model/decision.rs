//! Judgment, dossier, and verdict types
//!
//! These are the append-only artifacts of the pipeline: a judgment is
//! produced once per claim, dossier entries accumulate per story, and a
//! StoryResult is terminal (re-runs create a new one, never an update).

use serde::{Deserialize, Serialize};

use super::{Claim, Importance};

/// Relation between an evidence excerpt and a claim
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RelationLabel {
    #[serde(rename = "SUPPORT")]
    Support,
    #[serde(rename = "CONTRADICT")]
    Contradict,
    #[serde(rename = "NONE")]
    #[default]
    None,
}

impl std::fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationLabel::Support => write!(f, "SUPPORT"),
            RelationLabel::Contradict => write!(f, "CONTRADICT"),
            RelationLabel::None => write!(f, "NONE"),
        }
    }
}

/// A single authoritative relation call from the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationJudgment {
    pub label: RelationLabel,
    /// Probability-like confidence in [0, 1]
    pub confidence: f32,
    /// Free-text explanation of the constraint or refutation
    pub analysis: String,
    /// Identity of the classifier that produced this judgment
    pub source: String,
}

/// One row of the audit trail: a (claim, excerpt) pair actually used
/// in a judgment. `excerpt_text` is byte-identical to retrieved text;
/// truncation happens only at presentation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierEntry {
    pub story_id: String,
    pub claim_id: String,
    pub claim_text: String,
    pub excerpt_text: String,
    pub relation: RelationLabel,
    pub analysis: String,
}

/// Final decision for one claim, owning its dossier entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDecision {
    pub claim_id: String,
    pub story_id: String,
    /// Missing labels in foreign decision records read as NONE
    #[serde(default)]
    pub label: RelationLabel,
    /// Missing confidences read as 0.0
    #[serde(default)]
    pub confidence: f32,
    pub analysis: String,
    /// Identity of whatever produced the authoritative judgment
    /// (classifier name, or "policy-default" for fallbacks)
    #[serde(default)]
    pub source: String,
    /// Narrative weight carried through from the claim so the
    /// aggregator's core-override gate can see it.
    #[serde(default)]
    pub importance: Importance,
    pub evidence_entries: Vec<DossierEntry>,
}

impl ClaimDecision {
    /// Seal a judgment into the decision for its claim, threading the
    /// claim's importance through for the aggregator.
    pub fn from_judgment(
        claim: &Claim,
        judgment: RelationJudgment,
        evidence_entries: Vec<DossierEntry>,
    ) -> Self {
        Self {
            claim_id: claim.id.clone(),
            story_id: claim.story_id.clone(),
            label: judgment.label,
            confidence: judgment.confidence,
            analysis: judgment.analysis,
            source: judgment.source,
            importance: claim.importance,
            evidence_entries,
        }
    }
}

/// Terminal artifact for one story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryResult {
    pub story_id: String,
    /// 1 = consistent, 0 = contradicted
    pub prediction: u8,
    pub rationale: String,
    pub decisions: Vec<ClaimDecision>,
}
