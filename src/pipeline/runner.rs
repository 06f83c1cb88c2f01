//! Per-story pipeline and batch runner
//!
//! One story flows extract → retrieve → decide → aggregate → dossier.
//! Claims within a story are mutually non-interacting, but aggregation
//! waits on the full decision set. Across stories the batch is
//! embarrassingly parallel; the only shared resource is the results
//! log, which serializes its own appends.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::classify::ClaimDecisionEngine;
use crate::error::UpstreamError;
use crate::extract::ClaimExtractor;
use crate::model::{Claim, ClaimDecision};
use crate::retrieval::HybridRetriever;
use crate::utils::{retry_with_backoff, BackoffPolicy};
use crate::verdict::{CausalAggregator, DossierBuilder};

use super::results_log::ResultsLog;

/// One backstory to verify.
#[derive(Debug, Clone)]
pub struct StoryInput {
    pub story_id: String,
    pub backstory_text: String,
}

/// One completed verdict, as logged.
#[derive(Debug, Clone)]
pub struct StoryOutcome {
    pub story_id: String,
    pub prediction: u8,
    pub rationale: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Routing decision after classifying one claim. A future
/// low-confidence branch can requery with reformulated adversarial
/// queries by adding a `Requery` arm; today every decision proceeds
/// straight to aggregation.
enum ClaimStep {
    Aggregate(ClaimDecision),
}

fn route(decision: ClaimDecision) -> ClaimStep {
    ClaimStep::Aggregate(decision)
}

pub struct StoryPipeline {
    extractor: Arc<dyn ClaimExtractor>,
    retriever: HybridRetriever,
    engine: ClaimDecisionEngine,
    aggregator: CausalAggregator,
    dossiers: DossierBuilder,
    retrieval_k: usize,
    backoff: BackoffPolicy,
}

impl StoryPipeline {
    pub fn new(
        extractor: Arc<dyn ClaimExtractor>,
        retriever: HybridRetriever,
        engine: ClaimDecisionEngine,
        dossiers: DossierBuilder,
        retrieval_k: usize,
    ) -> Self {
        Self {
            extractor,
            retriever,
            engine,
            aggregator: CausalAggregator::new(),
            dossiers,
            retrieval_k,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the full pipeline for one story.
    pub async fn process_story(&self, input: &StoryInput) -> Result<StoryOutcome> {
        let claims = self.extract_claims(input).await?;
        info!("Story {}: {} claims extracted", input.story_id, claims.len());

        // Barrier: every claim must be decided before aggregation.
        let mut decisions = Vec::with_capacity(claims.len());
        for claim in &claims {
            let evidence = self.retriever.retrieve(claim, self.retrieval_k).await?;
            let decision = self.engine.decide(claim, &evidence).await?;
            match route(decision) {
                ClaimStep::Aggregate(decision) => decisions.push(decision),
            }
        }

        let result = self.aggregator.aggregate(decisions, &input.story_id);
        let rationale = self
            .dossiers
            .build(&input.story_id, &result.decisions, result.prediction)
            .await
            .context("persisting dossier")?;

        info!(
            "Story {}: prediction {} ({})",
            input.story_id, result.prediction, result.rationale
        );

        Ok(StoryOutcome {
            story_id: input.story_id.clone(),
            prediction: result.prediction,
            rationale,
        })
    }

    /// Extract claims with backoff on rate limits. An empty backstory or
    /// unparseable extractor output yields an empty claim set, which the
    /// aggregator turns into a well-formed default-consistent verdict.
    async fn extract_claims(&self, input: &StoryInput) -> Result<Vec<Claim>> {
        if input.backstory_text.trim().is_empty() {
            warn!("Story {}: empty backstory", input.story_id);
            return Ok(Vec::new());
        }

        let extracted = retry_with_backoff(self.backoff, "extractor", || {
            self.extractor.extract(&input.backstory_text, &input.story_id)
        })
        .await;

        match extracted {
            Ok(claims) => Ok(claims),
            Err(UpstreamError::Malformed(msg)) => {
                warn!(
                    "Story {}: extractor output unparseable ({}), proceeding with no claims",
                    input.story_id, msg
                );
                Ok(Vec::new())
            }
            Err(err) => {
                Err(anyhow::anyhow!(err).context(format!("extracting claims for story {}", input.story_id)))
            }
        }
    }

    /// Run a batch with resume: stories already present in the log are
    /// skipped, and no single story failure aborts the rest.
    pub async fn run_batch(
        &self,
        stories: Vec<StoryInput>,
        log: &ResultsLog,
        concurrency: usize,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        let pending: Vec<StoryInput> = stories
            .into_iter()
            .filter(|s| {
                if log.is_completed(&s.story_id) {
                    summary.skipped += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        info!(
            "Batch: {} pending, {} already completed",
            pending.len(),
            summary.skipped
        );

        let mut outcomes = stream::iter(pending.iter())
            .map(|input| async move { (input.story_id.clone(), self.process_story(input).await) })
            .buffer_unordered(concurrency.max(1));

        while let Some((story_id, outcome)) = outcomes.next().await {
            match outcome {
                Ok(outcome) => {
                    log.append(&outcome.story_id, outcome.prediction, &outcome.rationale)
                        .await?;
                    summary.processed += 1;
                }
                Err(err) => {
                    // Left unlogged so the next run retries it.
                    error!("Story {} failed, will retry on next run: {:#}", story_id, err);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classifier::{RelationClassifier, RelationSignals};
    use crate::model::{EvidenceCandidate, Importance};
    use crate::retrieval::EvidenceIndex;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::tempdir;

    struct FakeExtractor {
        claims: Vec<Claim>,
    }

    #[async_trait]
    impl ClaimExtractor for FakeExtractor {
        async fn extract(&self, _text: &str, _story_id: &str) -> Result<Vec<Claim>, UpstreamError> {
            Ok(self.claims.clone())
        }
    }

    struct FakeIndex {
        hits: Vec<EvidenceCandidate>,
    }

    #[async_trait]
    impl EvidenceIndex for FakeIndex {
        async fn query(&self, _q: &str, _k: usize) -> Result<Vec<EvidenceCandidate>, UpstreamError> {
            Ok(self.hits.clone())
        }
    }

    struct FakeClassifier {
        signals: RelationSignals,
    }

    #[async_trait]
    impl RelationClassifier for FakeClassifier {
        fn name(&self) -> &str {
            "fake"
        }
        async fn assess(
            &self,
            _claim: &str,
            _evidence: &[String],
        ) -> Result<RelationSignals, UpstreamError> {
            Ok(self.signals)
        }
    }

    fn pipeline(
        claims: Vec<Claim>,
        hits: Vec<EvidenceCandidate>,
        signals: RelationSignals,
        dossier_dir: &std::path::Path,
    ) -> StoryPipeline {
        let fast = BackoffPolicy {
            attempts: 2,
            initial_delay: Duration::from_millis(1),
            factor: 1.0,
        };
        StoryPipeline::new(
            Arc::new(FakeExtractor { claims }),
            HybridRetriever::new(Arc::new(FakeIndex { hits }), ""),
            ClaimDecisionEngine::new(Arc::new(FakeClassifier { signals })).with_backoff(fast),
            DossierBuilder::new(dossier_dir),
            5,
        )
        .with_backoff(fast)
    }

    fn core_claim(text: &str) -> Claim {
        let mut c = Claim::new("s1_c0", "s1", text);
        c.importance = Importance::Core;
        c
    }

    #[tokio::test]
    async fn contradicted_core_claim_rejects_story() {
        let dir = tempdir().unwrap();
        let p = pipeline(
            vec![core_claim("He never left France")],
            vec![EvidenceCandidate::new("He spent a decade in the Americas.", 0.9)],
            RelationSignals {
                max_contradiction: 0.93,
                max_entailment: 0.1,
            },
            dir.path(),
        );

        let outcome = p
            .process_story(&StoryInput {
                story_id: "s1".to_string(),
                backstory_text: "He never left France.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.prediction, 0);
        assert!(outcome.rationale.contains("[Evidence]:"));
    }

    #[tokio::test]
    async fn empty_backstory_defaults_to_consistent() {
        let dir = tempdir().unwrap();
        let p = pipeline(vec![], vec![], RelationSignals::default(), dir.path());

        let outcome = p
            .process_story(&StoryInput {
                story_id: "s2".to_string(),
                backstory_text: "   ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.prediction, 1);
        assert_eq!(
            outcome.rationale,
            "No sufficient evidence found to contradict/support."
        );
    }

    #[tokio::test]
    async fn batch_skips_completed_stories() {
        let dir = tempdir().unwrap();
        let p = pipeline(
            vec![],
            vec![],
            RelationSignals::default(),
            dir.path(),
        );

        let log_path = dir.path().join("results.csv");
        {
            let log = ResultsLog::open(&log_path).await.unwrap();
            log.append("done", 1, "ok").await.unwrap();
        }
        let log = ResultsLog::open(&log_path).await.unwrap();

        let stories = vec![
            StoryInput {
                story_id: "done".to_string(),
                backstory_text: "already processed".to_string(),
            },
            StoryInput {
                story_id: "fresh".to_string(),
                backstory_text: "new story".to_string(),
            },
        ];

        let summary = p.run_batch(stories, &log, 2).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        assert!(log.is_completed("done"));
    }

    #[tokio::test]
    async fn failing_story_does_not_abort_batch() {
        struct UnreachableExtractor;

        #[async_trait]
        impl ClaimExtractor for UnreachableExtractor {
            async fn extract(
                &self,
                _text: &str,
                _story_id: &str,
            ) -> Result<Vec<Claim>, UpstreamError> {
                Err(UpstreamError::Unreachable("refused".into()))
            }
        }

        let dir = tempdir().unwrap();
        let fast = BackoffPolicy {
            attempts: 2,
            initial_delay: Duration::from_millis(1),
            factor: 1.0,
        };
        let p = StoryPipeline::new(
            Arc::new(UnreachableExtractor),
            HybridRetriever::new(Arc::new(FakeIndex { hits: vec![] }), ""),
            ClaimDecisionEngine::new(Arc::new(FakeClassifier {
                signals: RelationSignals::default(),
            }))
            .with_backoff(fast),
            DossierBuilder::new(dir.path()),
            5,
        )
        .with_backoff(fast);

        let log = ResultsLog::open(dir.path().join("results.csv")).await.unwrap();
        let summary = p
            .run_batch(
                vec![StoryInput {
                    story_id: "s1".to_string(),
                    backstory_text: "text".to_string(),
                }],
                &log,
                1,
            )
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 0);
        // Unprocessed, so the next run will pick it up again.
        assert!(!log.is_completed("s1"));
    }
}
