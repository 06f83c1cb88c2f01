//! Confidence-gated claim decisions
//!
//! Wraps the relation classifier in the policy the aggregator depends
//! on: a relation only becomes a definite label above a high-confidence
//! gate, everything below it resolves toward consistency. The engine
//! also threads the claim's importance into the decision so the
//! aggregator's core-override gate can act on it.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::config::CLASSIFIER_GATE;
use crate::error::UpstreamError;
use crate::model::{
    Claim, ClaimDecision, DossierEntry, EvidenceCandidate, RelationJudgment, RelationLabel,
};
use crate::utils::{retry_with_backoff, BackoffPolicy};

use super::classifier::RelationClassifier;

const FALLBACK_CONFIDENCE: f32 = 0.5;

pub struct ClaimDecisionEngine {
    classifier: Arc<dyn RelationClassifier>,
    backoff: BackoffPolicy,
}

impl ClaimDecisionEngine {
    pub fn new(classifier: Arc<dyn RelationClassifier>) -> Self {
        Self {
            classifier,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Decide one claim against its retrieved evidence.
    ///
    /// Rate limits are retried with backoff; a malformed classifier
    /// response is an abstain, not a failure. Only an exhausted retry
    /// budget or an unreachable classifier propagates as an error.
    pub async fn decide(
        &self,
        claim: &Claim,
        evidence: &[EvidenceCandidate],
    ) -> Result<ClaimDecision> {
        if evidence.is_empty() {
            debug!("Claim {}: no evidence, default-consistent", claim.id);
            return Ok(self.fallback_decision(claim, evidence));
        }

        let evidence_texts: Vec<String> = evidence.iter().map(|e| e.text.clone()).collect();
        let signals = retry_with_backoff(self.backoff, "classifier", || {
            self.classifier.assess(&claim.text, &evidence_texts)
        })
        .await;

        let signals = match signals {
            Ok(signals) => signals,
            Err(UpstreamError::Malformed(msg)) => {
                warn!("Claim {}: classifier output unparseable ({}), treating as abstain", claim.id, msg);
                return Ok(self.fallback_decision(claim, evidence));
            }
            Err(err) => return Err(anyhow!(err).context(format!("classifying claim {}", claim.id))),
        };

        // Contradiction is checked first so a simultaneously high support
        // signal from a different excerpt cannot mask it.
        if signals.max_contradiction > CLASSIFIER_GATE {
            let judgment = RelationJudgment {
                label: RelationLabel::Contradict,
                confidence: signals.max_contradiction,
                analysis: format!(
                    "Narrative evidence contradicts the claim (strongest contradiction signal {:.2} across {} excerpts).",
                    signals.max_contradiction,
                    evidence.len()
                ),
                source: self.classifier.name().to_string(),
            };
            return Ok(self.definite_decision(claim, evidence, judgment));
        }

        if signals.max_entailment > CLASSIFIER_GATE {
            let judgment = RelationJudgment {
                label: RelationLabel::Support,
                confidence: signals.max_entailment,
                analysis: format!(
                    "Narrative evidence supports the claim (strongest entailment signal {:.2} across {} excerpts).",
                    signals.max_entailment,
                    evidence.len()
                ),
                source: self.classifier.name().to_string(),
            };
            return Ok(self.definite_decision(claim, evidence, judgment));
        }

        debug!(
            "Claim {}: ambiguous (contra {:.2}, entail {:.2}), resolving toward consistency",
            claim.id, signals.max_contradiction, signals.max_entailment
        );
        Ok(self.fallback_decision(claim, evidence))
    }

    /// Every excerpt used in a definite judgment becomes one dossier
    /// entry tagged with that judgment's label.
    fn definite_decision(
        &self,
        claim: &Claim,
        evidence: &[EvidenceCandidate],
        judgment: RelationJudgment,
    ) -> ClaimDecision {
        let entries = evidence
            .iter()
            .map(|e| DossierEntry {
                story_id: claim.story_id.clone(),
                claim_id: claim.id.clone(),
                claim_text: claim.text.clone(),
                excerpt_text: e.text.clone(),
                relation: judgment.label,
                analysis: judgment.analysis.clone(),
            })
            .collect();

        ClaimDecision::from_judgment(claim, judgment, entries)
    }

    /// Compatible-by-default: fires on empty evidence and on classifier
    /// abstention alike. Inspected-but-inconclusive excerpts still land
    /// in the dossier, tagged NONE.
    fn fallback_decision(&self, claim: &Claim, evidence: &[EvidenceCandidate]) -> ClaimDecision {
        let analysis = if evidence.is_empty() {
            "no evidence found; assuming consistency".to_string()
        } else {
            "evidence inspected but inconclusive; assuming consistency".to_string()
        };

        let entries = evidence
            .iter()
            .map(|e| DossierEntry {
                story_id: claim.story_id.clone(),
                claim_id: claim.id.clone(),
                claim_text: claim.text.clone(),
                excerpt_text: e.text.clone(),
                relation: RelationLabel::None,
                analysis: analysis.clone(),
            })
            .collect();

        let judgment = RelationJudgment {
            label: RelationLabel::Support,
            confidence: FALLBACK_CONFIDENCE,
            analysis,
            source: "policy-default".to_string(),
        };
        ClaimDecision::from_judgment(claim, judgment, entries)
    }
}
