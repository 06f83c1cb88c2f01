//! Bounded exponential backoff for rate-limit-class failures
//!
//! Only `UpstreamError::RateLimited` is retried; every other error is
//! re-raised on the first attempt so logic errors never get retried blindly.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::UpstreamError;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_delay: Duration,
    /// Multiplicative delay growth per retry
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            initial_delay: Duration::from_secs(5),
            factor: 1.5,
        }
    }
}

/// Run `op` until it succeeds, fails non-retryably, or the budget is spent.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: BackoffPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut delay = policy.initial_delay;
    let mut last_err = None;

    for attempt in 1..=policy.attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.attempts => {
                warn!(
                    "{}: rate limited, retrying in {:.1}s ({}/{})",
                    op_name,
                    delay.as_secs_f64(),
                    attempt,
                    policy.attempts
                );
                let jitter = Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0));
                tokio::time::sleep(delay + jitter).await;
                delay = delay.mul_f64(policy.factor);
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| UpstreamError::Unreachable(format!("{op_name}: no attempts made"))))
}
