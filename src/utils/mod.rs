//! Shared utilities

pub mod backoff;

pub use backoff::{retry_with_backoff, BackoffPolicy};
