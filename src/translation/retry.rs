use rand::Rng;
use std::time::Duration;

use crate::errors::TranslationError;
use crate::job::CancellationToken;

/// Exponential backoff policy for provider calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Add up to 25% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Create a policy with jitter enabled
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter: true,
        }
    }

    /// Policy without delays, for tests and benchmarks
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay to wait after `attempt` (1-based) has failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent).min(self.max_delay);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let jitter_ms = (delay.as_millis() as u64) / 4;
        let extra = rand::rng().random_range(0..=jitter_ms);
        (delay + Duration::from_millis(extra)).min(self.max_delay.max(delay))
    }
}

/// Sleep for `delay`, returning early if `cancel` fires
pub async fn pause(delay: Duration, cancel: Option<&CancellationToken>) -> Result<(), TranslationError> {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => Ok(()),
                _ = token.cancelled() => Err(TranslationError::Cancelled),
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}
