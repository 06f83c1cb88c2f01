//! Append-only results log
//!
//! One row per completed story (`Story ID, Prediction, Rationale`),
//! written incrementally so partial batch progress survives a crash.
//! Appends go through a single writer; the completed-id set loaded at
//! open time drives resume.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use super::csvio;

const HEADER: &str = "Story ID,Prediction,Rationale\n";

pub struct ResultsLog {
    path: PathBuf,
    writer: Mutex<tokio::fs::File>,
    completed: HashSet<String>,
}

impl ResultsLog {
    /// Open (or create) the log, loading already-completed story ids.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating results dir {parent:?}"))?;
        }

        let mut completed = HashSet::new();
        let mut needs_header = true;

        if path.exists() {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading existing results log {path:?}"))?;
            if !content.trim().is_empty() {
                needs_header = false;
                for record in csvio::parse_records(&content).iter().skip(1) {
                    if let Some(id) = record.first() {
                        completed.insert(id.clone());
                    }
                }
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening results log {path:?}"))?;

        if needs_header {
            file.write_all(HEADER.as_bytes()).await?;
            file.flush().await?;
        } else {
            info!("Resuming: {} stories already in results log", completed.len());
        }

        Ok(Self {
            path,
            writer: Mutex::new(file),
            completed,
        })
    }

    pub fn is_completed(&self, story_id: &str) -> bool {
        self.completed.contains(story_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one finished story. Serialized by the writer lock so
    /// concurrent story pipelines cannot interleave rows.
    pub async fn append(&self, story_id: &str, prediction: u8, rationale: &str) -> Result<()> {
        let row = csvio::format_row(&[story_id, &prediction.to_string(), rationale]);
        let mut writer = self.writer.lock().await;
        writer.write_all(row.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let log = ResultsLog::open(&path).await.unwrap();
        log.append("s1", 1, "Consistent with narrative evidence.").await.unwrap();
        log.append("s2", 0, "[Claim]: x | [Evidence]: \"y...\" | [Analysis]: z")
            .await
            .unwrap();
        drop(log);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let records = csvio::parse_records(&content);
        assert_eq!(records[0], vec!["Story ID", "Prediction", "Rationale"]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2][0], "s2");
        assert_eq!(records[2][1], "0");
    }

    #[tokio::test]
    async fn reopening_loads_completed_ids_without_duplicating_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        {
            let log = ResultsLog::open(&path).await.unwrap();
            log.append("s1", 1, "ok").await.unwrap();
        }

        let log = ResultsLog::open(&path).await.unwrap();
        assert!(log.is_completed("s1"));
        assert!(!log.is_completed("s2"));
        log.append("s2", 0, "bad, with a comma").await.unwrap();
        drop(log);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.matches("Story ID").count(), 1);
        let records = csvio::parse_records(&content);
        assert_eq!(records.len(), 3);
    }
}
