//! Upstream failure taxonomy
//!
//! The retry policy only ever retries rate-limit-class failures, so the
//! collaborator clients must report failures in a form the policy layer
//! can discriminate on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 429 / quota-class failure; safe to retry with backoff
    #[error("rate limited by upstream service: {0}")]
    RateLimited(String),

    /// Connection-level failure; the index degrades to empty evidence,
    /// other services surface this as a per-story failure
    #[error("upstream service unreachable: {0}")]
    Unreachable(String),

    /// Response arrived but could not be parsed; treated as an abstain
    /// by the classification policy, never as a crash
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Any other non-success status
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl UpstreamError {
    /// Only rate-limit-class failures are eligible for blind retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::RateLimited(_))
    }

    /// Classify a transport-level reqwest failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            UpstreamError::RateLimited(err.to_string())
        } else if err.is_connect() || err.is_timeout() {
            UpstreamError::Unreachable(err.to_string())
        } else {
            UpstreamError::Status {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                body: err.to_string(),
            }
        }
    }

    /// Classify an HTTP status code with its body.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            UpstreamError::RateLimited(body)
        } else {
            UpstreamError::Status { status, body }
        }
    }
}
