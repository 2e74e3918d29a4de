//! Bounded retry with exponential backoff for notification delivery.
//!
//! Only [`ChannelError::Transient`] failures are retried. Permanent
//! failures (rejected payload, unknown recipient) return immediately.

use std::future::Future;
use std::time::Duration;

use super::channel::ChannelError;

/// Retry budget for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each following one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 retries, 200ms → 400ms → 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `f` until it succeeds, fails permanently, or the budget runs out.
///
/// Returns the final result and the number of attempts made.
pub(crate) async fn deliver_with_retry<F, Fut>(
    policy: RetryPolicy,
    channel: &str,
    f: F,
) -> (Result<(), ChannelError>, u32)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), ChannelError>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Ok(()) => return (Ok(()), attempt + 1),
            Err(e @ ChannelError::Permanent(_)) => return (Err(e), attempt + 1),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    channel,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "notification delivery failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    // Final attempt, no more retries.
    (f().await, policy.max_retries + 1)
}
