//! Relation classifier boundary
//!
//! The NLI model itself is an external service; the core depends on
//! this trait. A classifier compares every excerpt against the claim
//! and reports the strongest contradiction and the strongest support
//! signal it saw as two separate maxima. They are deliberately never
//! merged: a high support score from one excerpt must not mask a high
//! contradiction score from another.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::UpstreamError;

/// Per-relation maxima observed across one claim's evidence set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationSignals {
    /// Highest contradiction probability seen for any excerpt
    pub max_contradiction: f32,
    /// Highest entailment probability seen for any excerpt
    pub max_entailment: f32,
}

#[async_trait]
pub trait RelationClassifier: Send + Sync {
    /// Identity recorded in the resulting judgment's `source` field.
    fn name(&self) -> &str;

    /// Assess `claim_text` against each excerpt; evidence is the premise,
    /// the claim is the hypothesis.
    async fn assess(
        &self,
        claim_text: &str,
        evidence_texts: &[String],
    ) -> Result<RelationSignals, UpstreamError>;
}

/// Wire shape: one probability triple per (excerpt, claim) pair.
#[derive(Debug, Clone, Deserialize)]
struct PairProbabilities {
    #[serde(default)]
    contradiction: f32,
    #[serde(default)]
    entailment: f32,
    #[serde(default)]
    #[allow(dead_code)]
    neutral: f32,
}

/// HTTP client for an NLI cross-encoder service.
pub struct RemoteNliClassifier {
    client: Client,
    url: String,
    name: String,
}

impl RemoteNliClassifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            name: "remote-nli".to_string(),
        }
    }
}

#[async_trait]
impl RelationClassifier for RemoteNliClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn assess(
        &self,
        claim_text: &str,
        evidence_texts: &[String],
    ) -> Result<RelationSignals, UpstreamError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({
                "hypothesis": claim_text,
                "premises": evidence_texts,
            }))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), body));
        }

        let pairs: Vec<PairProbabilities> = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        let mut signals = RelationSignals::default();
        for pair in &pairs {
            signals.max_contradiction = signals.max_contradiction.max(pair.contradiction);
            signals.max_entailment = signals.max_entailment.max(pair.entailment);
        }

        debug!(
            "NLI signals: contra {:.2}, entail {:.2} over {} pairs",
            signals.max_contradiction,
            signals.max_entailment,
            pairs.len()
        );

        Ok(signals)
    }
}
