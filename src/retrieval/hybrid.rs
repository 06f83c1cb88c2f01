//! Hybrid adversarial retrieval
//!
//! Issues the claim text plus every adversarial paraphrase as separate
//! queries, deduplicates across the rounds, then re-ranks a bounded
//! window by a fused score: semantic similarity dominates, lexical
//! overlap sharpens precision, and narrative position nudges later
//! passages upward since late developments tend to resolve or contradict
//! early claims about a character.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::{LEXICAL_WEIGHT, POSITION_NORMALIZER, SEMANTIC_WEIGHT, TEMPORAL_WEIGHT};
use crate::model::{Claim, EvidenceCandidate};

use super::index::EvidenceIndex;

/// BM25 parameters for lexical scoring over the re-ranking window.
const BM25_K1: f32 = 1.5;
const BM25_B: f32 = 0.75;

pub struct HybridRetriever {
    index: Arc<dyn EvidenceIndex>,
    query_prefix: String,
}

impl HybridRetriever {
    pub fn new(index: Arc<dyn EvidenceIndex>, query_prefix: impl Into<String>) -> Self {
        Self {
            index,
            query_prefix: query_prefix.into(),
        }
    }

    /// Retrieve up to `k` deduplicated, fusion-ranked candidates for a claim.
    ///
    /// An unreachable index is not an error: queries that fail are skipped,
    /// and if every query fails the claim simply has no evidence.
    pub async fn retrieve(&self, claim: &Claim, k: usize) -> Result<Vec<EvidenceCandidate>> {
        let mut seen = HashSet::new();
        let mut pool: Vec<EvidenceCandidate> = Vec::new();

        for query in claim.query_set() {
            let full_query = format!("{}{}", self.query_prefix, query);
            match self.index.query(&full_query, k).await {
                Ok(hits) => {
                    // First occurrence wins, stable by query-issue order.
                    for hit in hits {
                        if seen.insert(hit.text.clone()) {
                            pool.push(hit);
                        }
                    }
                }
                Err(err) => {
                    warn!("Index query failed for claim {}: {}", claim.id, err);
                }
            }
        }

        if pool.is_empty() {
            debug!("No evidence retrieved for claim {}", claim.id);
            return Ok(Vec::new());
        }

        Ok(rerank(pool, claim, k))
    }
}

/// Re-rank the deduplicated pool: a semantic top-2k window bounds the
/// lexical scoring cost on long novels, then candidates are fused and
/// stable-sorted back in issue order.
fn rerank(pool: Vec<EvidenceCandidate>, claim: &Claim, k: usize) -> Vec<EvidenceCandidate> {
    // Remember issue order for the final stable tie-break.
    let mut indexed: Vec<(usize, EvidenceCandidate)> = pool.into_iter().enumerate().collect();

    indexed.sort_by(|a, b| {
        b.1.semantic_score
            .partial_cmp(&a.1.semantic_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indexed.truncate(k * 2);

    // Lexical scoring against the claim text plus all adversarial queries.
    let query_terms = tokenize(&claim.query_set().join(" "));
    let docs: Vec<Vec<String>> = indexed.iter().map(|(_, c)| tokenize(&c.text)).collect();
    let raw_lexical = bm25_scores(&query_terms, &docs);
    let lexical_max = raw_lexical.iter().cloned().fold(0.0f32, f32::max);

    for ((_, candidate), raw) in indexed.iter_mut().zip(raw_lexical.iter()) {
        candidate.lexical_score = *raw;
    }

    let mut scored: Vec<(usize, f32, EvidenceCandidate)> = indexed
        .into_iter()
        .map(|(issue_order, candidate)| {
            let lexical = if lexical_max > 0.0 {
                candidate.lexical_score / lexical_max
            } else {
                0.0
            };
            let position = candidate.position.unwrap_or(0) as f64;
            let temporal = (position / POSITION_NORMALIZER).min(1.0) as f32;
            let fused = SEMANTIC_WEIGHT * candidate.semantic_score
                + LEXICAL_WEIGHT * lexical
                + TEMPORAL_WEIGHT * temporal;
            (issue_order, fused, candidate)
        })
        .collect();

    // Stable sort over issue order so equal fused scores keep it.
    scored.sort_by_key(|(issue_order, _, _)| *issue_order);
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    scored.into_iter().map(|(_, _, c)| c).collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Okapi BM25 over the window, the window itself acting as the corpus.
fn bm25_scores(query_terms: &[String], docs: &[Vec<String>]) -> Vec<f32> {
    let n = docs.len();
    if n == 0 {
        return Vec::new();
    }

    let avg_len = docs.iter().map(|d| d.len()).sum::<usize>() as f32 / n as f32;
    let unique_query: HashSet<&String> = query_terms.iter().collect();

    docs.iter()
        .map(|doc| {
            let doc_len = doc.len() as f32;
            unique_query
                .iter()
                .map(|term| {
                    let tf = doc.iter().filter(|t| *t == *term).count() as f32;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let df = docs.iter().filter(|d| d.contains(*term)).count() as f32;
                    let idf = (((n as f32 - df + 0.5) / (df + 0.5)) + 1.0).ln();
                    let denom =
                        tf + BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / avg_len.max(1.0));
                    idf * tf * (BM25_K1 + 1.0) / denom
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fake index keyed by the query suffix (after the prefix).
    struct FakeIndex {
        responses: HashMap<String, Vec<EvidenceCandidate>>,
        fail_queries: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeIndex {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                fail_queries: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, query: &str, hits: Vec<EvidenceCandidate>) -> Self {
            self.responses.insert(query.to_string(), hits);
            self
        }

        fn failing(mut self, query: &str) -> Self {
            self.fail_queries.push(query.to_string());
            self
        }
    }

    #[async_trait]
    impl EvidenceIndex for FakeIndex {
        async fn query(
            &self,
            query: &str,
            _k: usize,
        ) -> Result<Vec<EvidenceCandidate>, UpstreamError> {
            self.calls.lock().unwrap().push(query.to_string());
            if self.fail_queries.iter().any(|q| query.ends_with(q.as_str())) {
                return Err(UpstreamError::Unreachable("connection refused".into()));
            }
            Ok(self
                .responses
                .iter()
                .find(|(q, _)| query.ends_with(q.as_str()))
                .map(|(_, hits)| hits.to_vec())
                .unwrap_or_default())
        }
    }

    fn claim_with_queries(text: &str, adversarial: &[&str]) -> Claim {
        let mut claim = Claim::new("s1_c0", "s1", text);
        claim.adversarial_queries = adversarial.iter().map(|s| s.to_string()).collect();
        claim
    }

    fn hit(text: &str, score: f32) -> EvidenceCandidate {
        EvidenceCandidate::new(text, score)
    }

    #[tokio::test]
    async fn deduplicates_across_queries_first_occurrence_wins() {
        let shared = hit("the captain sailed at dawn", 0.7);
        let index = FakeIndex::new()
            .with("he sailed", vec![shared.clone(), hit("a storm rose", 0.6)])
            .with("he stayed ashore", vec![hit("the captain sailed at dawn", 0.95)]);

        let retriever = HybridRetriever::new(Arc::new(index), "");
        let claim = claim_with_queries("he sailed", &["he stayed ashore"]);
        let results = retriever.retrieve(&claim, 5).await.unwrap();

        let texts: Vec<_> = results.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts.iter().filter(|t| **t == "the captain sailed at dawn").count(), 1);
        // First occurrence (score 0.7) won over the later duplicate.
        let kept = results.iter().find(|c| c.text == "the captain sailed at dawn").unwrap();
        assert!((kept.semantic_score - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn never_returns_more_than_k() {
        let hits: Vec<_> = (0..20).map(|i| hit(&format!("excerpt {i}"), 0.5)).collect();
        let index = FakeIndex::new().with("claim", hits);

        let retriever = HybridRetriever::new(Arc::new(index), "");
        let claim = claim_with_queries("claim", &[]);
        let results = retriever.retrieve(&claim, 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn failed_query_is_skipped_partial_results_survive() {
        let index = FakeIndex::new()
            .failing("he fought")
            .with("he was gentle", vec![hit("he never raised his voice", 0.8)]);

        let retriever = HybridRetriever::new(Arc::new(index), "");
        let claim = claim_with_queries("he was gentle", &["he fought"]);
        let results = retriever.retrieve(&claim, 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "he never raised his voice");
    }

    #[tokio::test]
    async fn all_queries_failing_yields_empty_not_error() {
        let index = FakeIndex::new().failing("lost claim");
        let retriever = HybridRetriever::new(Arc::new(index), "");
        let claim = claim_with_queries("lost claim", &[]);

        let results = retriever.retrieve(&claim, 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn later_position_outranks_earlier_at_equal_similarity() {
        let mut early = hit("he abandoned the voyage quietly", 0.8);
        early.position = Some(1_000);
        let mut late = hit("he abandoned the voyage in fury", 0.8);
        late.position = Some(90_000);

        let index = FakeIndex::new().with("voyage", vec![early, late]);
        let retriever = HybridRetriever::new(Arc::new(index), "");
        let claim = claim_with_queries("voyage", &[]);

        let results = retriever.retrieve(&claim, 2).await.unwrap();
        assert_eq!(results[0].text, "he abandoned the voyage in fury");
    }

    #[tokio::test]
    async fn query_prefix_is_applied() {
        let index = FakeIndex::new();
        let calls_handle = Arc::new(index);
        let retriever = HybridRetriever::new(calls_handle.clone(), "BOOK_CONTEXT. ");
        let claim = claim_with_queries("she fled the city", &[]);

        retriever.retrieve(&claim, 5).await.unwrap();
        let calls = calls_handle.calls.lock().unwrap();
        assert_eq!(calls[0], "BOOK_CONTEXT. she fled the city");
    }

    #[test]
    fn missing_position_scores_as_zero_temporal() {
        let claim = claim_with_queries("anything", &[]);
        let no_pos = hit("alpha", 0.5);
        let mut with_pos = hit("beta", 0.5);
        with_pos.position = Some(200_000);

        let ranked = rerank(vec![no_pos, with_pos], &claim, 2);
        // Position beyond the normalizer caps the temporal term at 1.0.
        assert_eq!(ranked[0].text, "beta");
        assert_eq!(ranked[1].text, "alpha");
    }

    #[test]
    fn lexical_overlap_breaks_semantic_ties() {
        let claim = claim_with_queries("the duel at the abbey", &[]);
        let on_topic = hit("the duel at the abbey ended badly", 0.6);
        let off_topic = hit("harvest season came and went", 0.6);

        let ranked = rerank(vec![off_topic, on_topic], &claim, 2);
        assert_eq!(ranked[0].text, "the duel at the abbey ended badly");
    }
}
