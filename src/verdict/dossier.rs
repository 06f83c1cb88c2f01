//! Dossier persistence and rationale rendering
//!
//! The dossier is the audit trail: every (claim, excerpt) pair that fed
//! a judgment, with verbatim excerpt text. The rationale is a strict
//! three-field summary quoting one entry chosen to agree with the
//! verdict whenever such an entry exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::model::{ClaimDecision, DossierEntry, RelationLabel};

/// Excerpt quote length in the rationale; presentation-only, the stored
/// dossier keeps the full verbatim text.
const EXCERPT_QUOTE_CHARS: usize = 150;

const NO_EVIDENCE_RATIONALE: &str = "No sufficient evidence found to contradict/support.";

/// On-disk shape of one story's dossier.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoryDossier {
    pub story_id: String,
    pub prediction: u8,
    pub dossier: Vec<DossierEntry>,
    pub generated_at: chrono::DateTime<Utc>,
}

pub struct DossierBuilder {
    dossiers_dir: PathBuf,
}

impl DossierBuilder {
    pub fn new(dossiers_dir: impl Into<PathBuf>) -> Self {
        Self {
            dossiers_dir: dossiers_dir.into(),
        }
    }

    /// Persist the full structured dossier for a story and return the
    /// rendered rationale string.
    pub async fn build(
        &self,
        story_id: &str,
        decisions: &[ClaimDecision],
        prediction: u8,
    ) -> Result<String> {
        let entries: Vec<DossierEntry> = decisions
            .iter()
            .flat_map(|d| d.evidence_entries.iter().cloned())
            .collect();

        let dossier = StoryDossier {
            story_id: story_id.to_string(),
            prediction,
            dossier: entries,
            generated_at: Utc::now(),
        };

        fs::create_dir_all(&self.dossiers_dir)
            .await
            .with_context(|| format!("creating dossier dir {:?}", self.dossiers_dir))?;

        let path = self.path_for(story_id);
        let json = serde_json::to_vec_pretty(&dossier)?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("writing dossier {path:?}"))?;

        info!("Dossier for story {} saved ({} entries)", story_id, dossier.dossier.len());
        Ok(render_rationale(&dossier.dossier, prediction))
    }

    pub fn path_for(&self, story_id: &str) -> PathBuf {
        self.dossiers_dir.join(format!("story_{story_id}_dossier.json"))
    }

    pub fn dossiers_dir(&self) -> &Path {
        &self.dossiers_dir
    }
}

/// Render the fixed `[Claim] | [Evidence] | [Analysis]` rationale.
///
/// Quote selection prefers an entry whose relation agrees with the
/// verdict: a contradiction for rejections, a support for acceptances,
/// then any entry at all.
pub fn render_rationale(entries: &[DossierEntry], prediction: u8) -> String {
    if entries.is_empty() {
        return NO_EVIDENCE_RATIONALE.to_string();
    }

    let first_with = |relation: RelationLabel| entries.iter().find(|e| e.relation == relation);

    let selected = match prediction {
        0 => first_with(RelationLabel::Contradict),
        _ => first_with(RelationLabel::Support),
    }
    .unwrap_or(&entries[0]);

    let excerpt: String = selected
        .excerpt_text
        .chars()
        .take(EXCERPT_QUOTE_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    format!(
        "[Claim]: {} | [Evidence]: \"{}...\" | [Analysis]: {}",
        selected.claim_text, excerpt, selected.analysis
    )
}
