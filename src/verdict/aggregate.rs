//! Causal aggregation of claim decisions
//!
//! Three sequential gates, first match wins:
//! 1. a decisively contradicted core claim rejects the story outright,
//! 2. cumulative contradictions outweighing half the support rejects,
//! 3. enough corroborated support accepts;
//! otherwise the story is accepted by default. Contradiction is treated
//! asymmetrically: the system is conservative about falsification, not
//! about support.
//!
//! Pure function of the decision list; aggregating the same decisions
//! twice always yields the same verdict and rationale.

use tracing::debug;

use crate::config::{CONTRADICTION_MULTIPLIER, CORE_OVERRIDE_THRESHOLD, SUPPORT_THRESHOLD};
use crate::model::{ClaimDecision, Importance, RelationLabel, StoryResult};

pub struct CausalAggregator {
    core_threshold: f32,
    support_threshold: f32,
    contradiction_multiplier: f32,
}

impl Default for CausalAggregator {
    fn default() -> Self {
        Self {
            core_threshold: CORE_OVERRIDE_THRESHOLD,
            support_threshold: SUPPORT_THRESHOLD,
            contradiction_multiplier: CONTRADICTION_MULTIPLIER,
        }
    }
}

impl CausalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, decisions: Vec<ClaimDecision>, story_id: &str) -> StoryResult {
        // Gate 1: core-claim override. One decisively falsified
        // load-bearing claim invalidates the whole backstory.
        let core_contradictions: Vec<&ClaimDecision> = decisions
            .iter()
            .filter(|d| {
                d.label == RelationLabel::Contradict
                    && d.confidence >= self.core_threshold
                    && d.importance == Importance::Core
            })
            .collect();

        if !core_contradictions.is_empty() {
            let rationale = format!(
                "Rejected due to {} core contradiction(s). Example: {}",
                core_contradictions.len(),
                core_contradictions[0].analysis
            );
            debug!("Story {}: core override fired", story_id);
            return StoryResult {
                story_id: story_id.to_string(),
                prediction: 0,
                rationale,
                decisions,
            };
        }

        // Gate 2: weighted cumulative scores.
        let support_score: f32 = decisions
            .iter()
            .filter(|d| d.label == RelationLabel::Support)
            .map(|d| d.confidence)
            .sum();
        let contradict_score: f32 = decisions
            .iter()
            .filter(|d| d.label == RelationLabel::Contradict)
            .map(|d| d.confidence)
            .sum();

        debug!(
            "Story {}: support {:.2}, contradict {:.2}",
            story_id, support_score, contradict_score
        );

        let (prediction, rationale) = if contradict_score > support_score * self.contradiction_multiplier {
            (0, "Cumulative contradictions outweigh support signals.".to_string())
        } else if support_score >= self.support_threshold {
            // Gate 3: support sufficiency.
            (1, "Consistent with narrative evidence.".to_string())
        } else {
            (1, "No significant contradictions found; assumed consistent.".to_string())
        };

        StoryResult {
            story_id: story_id.to_string(),
            prediction,
            rationale,
            decisions,
        }
    }
}
