//! services/api/src/planner/retry.rs
//!
//! Bounded retry with exponential backoff, used for image generation.

use std::future::Future;
use std::time::Duration;
use tracing::warn;
use travel_planner_core::ports::PortResult;

/// How many times a failed call is retried and how long to wait before each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): the base, doubled each time.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runs `operation` until it succeeds or the policy's retries are spent,
/// returning the last error in the latter case.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> PortResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.retries => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    label,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
