//! Story Pipeline
//!
//! Batch orchestration: per-story processing, the append-only results
//! log, and the CSV plumbing both share.

pub mod csvio;
pub mod results_log;
pub mod runner;

pub use results_log::ResultsLog;
pub use runner::{BatchSummary, StoryInput, StoryOutcome, StoryPipeline};
