//! Claim Extraction

pub mod extractor;

pub use extractor::{ClaimExtractor, LlmClaimExtractor};
