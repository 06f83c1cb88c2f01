//! Batch verification runner
//!
//! Reads a dataset CSV (`id, ..., content` columns), runs the claim
//! verification pipeline per story, and appends verdicts to the
//! append-only results log. Re-running resumes where the last run
//! stopped.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use narrative_verifier::classify::{ClaimDecisionEngine, RemoteNliClassifier};
use narrative_verifier::config::VerifierConfig;
use narrative_verifier::extract::LlmClaimExtractor;
use narrative_verifier::pipeline::{csvio, ResultsLog, StoryInput, StoryPipeline};
use narrative_verifier::retrieval::{HybridRetriever, RemoteEvidenceIndex};
use narrative_verifier::verdict::DossierBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("narrative_verifier=info")),
        )
        .with_target(false)
        .init();

    let dataset_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/test.csv".to_string());

    let config = VerifierConfig::from_env();
    info!("Loading dataset from {}", dataset_path);
    let stories = load_stories(&dataset_path).await?;
    info!("Loaded {} stories", stories.len());

    // Collaborators are constructed once here and injected; nothing in
    // the pipeline reaches for process-wide globals.
    let index = Arc::new(RemoteEvidenceIndex::new(&config.index_url));
    let classifier = Arc::new(RemoteNliClassifier::new(&config.classifier_url));
    let extractor = Arc::new(LlmClaimExtractor::new(
        &config.extractor_url,
        &config.extractor_model,
        config.extractor_api_key.clone(),
    ));

    let pipeline = StoryPipeline::new(
        extractor,
        HybridRetriever::new(index, config.query_prefix.clone()),
        ClaimDecisionEngine::new(classifier),
        DossierBuilder::new(&config.dossiers_dir),
        config.retrieval_k,
    );

    let log = ResultsLog::open(&config.results_path).await?;
    let summary = pipeline
        .run_batch(stories, &log, config.story_concurrency)
        .await?;

    info!(
        "Batch complete: {} processed, {} skipped (resumed), {} failed",
        summary.processed, summary.skipped, summary.failed
    );
    info!("Results at {:?}", log.path());

    Ok(())
}

/// Load `(id, content)` pairs from a dataset CSV, locating the columns
/// by header name.
async fn load_stories(path: &str) -> Result<Vec<StoryInput>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading dataset {path}"))?;
    let records = csvio::parse_records(&content);

    let Some(header) = records.first() else {
        bail!("dataset {path} is empty");
    };

    let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));
    let id_col = find("id").context("dataset has no 'id' column")?;
    let content_col = find("content").context("dataset has no 'content' column")?;

    Ok(records
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, record)| StoryInput {
            story_id: record
                .get(id_col)
                .cloned()
                .unwrap_or_else(|| i.to_string()),
            backstory_text: record.get(content_col).cloned().unwrap_or_default(),
        })
        .collect())
}
