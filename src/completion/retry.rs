//! Explicit retry schedule applied by the completion clients.

use super::CompletionError;
use std::future::Future;
use std::time::Duration;

/// Retry schedule with exponential backoff.
///
/// Retry semantics are part of the client contract, so the policy is a value the clients
/// carry rather than behavior hidden inside them. The default matches the providers'
/// guidance for transient failures: three attempts, two seconds before the first retry,
/// doubling each time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    multiplier: u32,
}

impl RetryPolicy {
    /// Build a policy. The attempt count is clamped to at least one.
    pub fn new(max_attempts: usize, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: multiplier.max(1),
        }
    }

    /// Delay inserted after the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2), 2)
    }
}

/// Run `attempt` until it succeeds, retrying transient failures per the policy.
///
/// Non-transient errors and the final transient error surface unchanged.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<T, CompletionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CompletionError>>,
{
    let mut attempts = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if attempts < policy.max_attempts && error.is_transient() => {
                let delay = policy.delay_for_attempt(attempts);
                tracing::warn!(
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient completion failure; retrying"
                );
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
