//! Claim extraction boundary
//!
//! An LLM breaks a backstory into atomic claims, each with adversarial
//! search queries aimed at finding contradictions. The model is external;
//! the core owns only the prompt contract and the response parsing.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::UpstreamError;
use crate::model::{Claim, Importance};

#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    async fn extract(
        &self,
        backstory_text: &str,
        story_id: &str,
    ) -> Result<Vec<Claim>, UpstreamError>;
}

/// Raw claim shape as the LLM emits it, before ids are assigned.
#[derive(Debug, Deserialize)]
struct RawClaim {
    text: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    importance: Option<String>,
    #[serde(default)]
    adversarial_queries: Vec<String>,
}

/// Some models wrap the list in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawClaimResponse {
    List(Vec<RawClaim>),
    Wrapped { claims: Vec<RawClaim> },
}

const EXTRACTION_PROMPT: &str = r#"You are an expert analyst. Break down the following backstory into atomic, verifiable claims.
For each claim, generate 2-3 "Adversarial Search Queries" to find potential CONTRADICTIONS in the novel.

Example:
Claim: "He was a pacifist."
Adversarial Queries: ["he punched", "he killed", "he used a weapon", "he fought"]

Backstory:
{backstory}

Output a JSON list of objects with keys:
"text" (the claim),
"type" (event/belief/etc),
"importance" (core/detail),
"adversarial_queries" (list of strings).

IMPORTANT: Return ONLY the JSON. No markdown code blocks."#;

/// Extractor backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmClaimExtractor {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClaimExtractor {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ClaimExtractor for LlmClaimExtractor {
    async fn extract(
        &self,
        backstory_text: &str,
        story_id: &str,
    ) -> Result<Vec<Claim>, UpstreamError> {
        let prompt = EXTRACTION_PROMPT.replace("{backstory}", backstory_text);

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.0,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(UpstreamError::from_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), body));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| UpstreamError::Malformed("no message content in response".into()))?;

        let claims = parse_claims(content, story_id)?;
        debug!("Extracted {} claims for story {}", claims.len(), story_id);
        Ok(claims)
    }
}

/// Parse the model's JSON output into claims, assigning sequential ids.
pub fn parse_claims(content: &str, story_id: &str) -> Result<Vec<Claim>, UpstreamError> {
    let cleaned = strip_markdown_fences(content);

    let raw: RawClaimResponse = serde_json::from_str(cleaned)
        .map_err(|e| UpstreamError::Malformed(format!("claim JSON: {e}")))?;
    let raw = match raw {
        RawClaimResponse::List(list) => list,
        RawClaimResponse::Wrapped { claims } => claims,
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| Claim {
            id: format!("{story_id}_c{i}"),
            story_id: story_id.to_string(),
            text: r.text,
            kind: r.kind,
            importance: match r.importance.as_deref() {
                Some("core") => Importance::Core,
                // Unknown or absent markers default to detail.
                _ => Importance::Detail,
            },
            adversarial_queries: r.adversarial_queries,
        })
        .collect())
}

/// Models sometimes wrap the JSON in a code fence despite instructions.
fn strip_markdown_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
