//! Runtime configuration
//!
//! Everything is env-var driven with sensible defaults so a batch run
//! needs no config file. `dotenv` is loaded by main before this is read.

use std::path::PathBuf;

/// Fusion weights for hybrid re-ranking: semantic relevance dominates,
/// lexical precision and narrative chronology break ties.
pub const SEMANTIC_WEIGHT: f32 = 0.6;
pub const LEXICAL_WEIGHT: f32 = 0.25;
pub const TEMPORAL_WEIGHT: f32 = 0.15;

/// Character offset beyond which narrative position stops mattering.
pub const POSITION_NORMALIZER: f64 = 100_000.0;

/// Classifier confidence gate: below this, the engine treats the
/// classifier as having abstained.
pub const CLASSIFIER_GATE: f32 = 0.8;

/// Aggregation thresholds (see `verdict::aggregate`).
pub const CORE_OVERRIDE_THRESHOLD: f32 = 0.8;
pub const SUPPORT_THRESHOLD: f32 = 2.0;
pub const CONTRADICTION_MULTIPLIER: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Vector store retrieval endpoint
    pub index_url: String,
    /// NLI relation classifier endpoint
    pub classifier_url: String,
    /// OpenAI-compatible chat endpoint for claim extraction
    pub extractor_url: String,
    pub extractor_model: String,
    pub extractor_api_key: Option<String>,
    /// Candidates requested per query
    pub retrieval_k: usize,
    /// Prefix prepended to every retrieval query
    pub query_prefix: String,
    /// Directory for per-story dossier JSON files
    pub dossiers_dir: PathBuf,
    /// Append-only results log (Story ID, Prediction, Rationale)
    pub results_path: PathBuf,
    /// Stories processed concurrently
    pub story_concurrency: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            index_url: "http://127.0.0.1:8765/v1/retrieve".to_string(),
            classifier_url: "http://127.0.0.1:8766/v1/classify".to_string(),
            extractor_url: "http://127.0.0.1:11434/v1".to_string(),
            extractor_model: "gemini-pro".to_string(),
            extractor_api_key: None,
            retrieval_k: 10,
            query_prefix: "BOOK_CONTEXT. ".to_string(),
            dossiers_dir: PathBuf::from("data/processed/dossiers"),
            results_path: PathBuf::from("results/results.csv"),
            story_concurrency: 4,
        }
    }
}

impl VerifierConfig {
    /// Build from environment, falling back to defaults field by field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            index_url: env_or("VERIFIER_INDEX_URL", &defaults.index_url),
            classifier_url: env_or("VERIFIER_CLASSIFIER_URL", &defaults.classifier_url),
            extractor_url: env_or("VERIFIER_EXTRACTOR_URL", &defaults.extractor_url),
            extractor_model: env_or("VERIFIER_EXTRACTOR_MODEL", &defaults.extractor_model),
            extractor_api_key: std::env::var("VERIFIER_EXTRACTOR_API_KEY").ok(),
            retrieval_k: std::env::var("VERIFIER_RETRIEVAL_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retrieval_k),
            query_prefix: env_or("VERIFIER_QUERY_PREFIX", &defaults.query_prefix),
            dossiers_dir: PathBuf::from(env_or(
                "VERIFIER_DOSSIERS_DIR",
                &defaults.dossiers_dir.to_string_lossy(),
            )),
            results_path: PathBuf::from(env_or(
                "VERIFIER_RESULTS_PATH",
                &defaults.results_path.to_string_lossy(),
            )),
            story_concurrency: std::env::var("VERIFIER_STORY_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.story_concurrency),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
