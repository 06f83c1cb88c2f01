//! Evidence index boundary
//!
//! The vector store that chunks and embeds the novels is an external
//! service; the core only depends on this trait and its wire shape.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::UpstreamError;
use crate::model::EvidenceCandidate;

/// Black-box search service over the indexed novel text.
#[async_trait]
pub trait EvidenceIndex: Send + Sync {
    /// Return up to `k` ranked candidates for `query`.
    async fn query(&self, query: &str, k: usize) -> Result<Vec<EvidenceCandidate>, UpstreamError>;
}

/// Wire shape of one index hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHit {
    pub text: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: IndexHitMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexHitMetadata {
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<IndexHit> for EvidenceCandidate {
    fn from(hit: IndexHit) -> Self {
        EvidenceCandidate {
            text: hit.text,
            semantic_score: hit.score,
            lexical_score: 0.0,
            position: hit.metadata.position,
            source_id: hit.metadata.source,
        }
    }
}

/// HTTP client for the retrieval endpoint.
pub struct RemoteEvidenceIndex {
    client: Client,
    url: String,
}

impl RemoteEvidenceIndex {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl EvidenceIndex for RemoteEvidenceIndex {
    async fn query(&self, query: &str, k: usize) -> Result<Vec<EvidenceCandidate>, UpstreamError> {
        debug!("Index query ({} chars, k={})", query.len(), k);

        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "query": query, "k": k }))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), body));
        }

        let hits: Vec<IndexHit> = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        Ok(hits.into_iter().map(EvidenceCandidate::from).collect())
    }
}
