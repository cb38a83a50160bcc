//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Immutable retry schedule for a dispatcher.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ratio: f64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ratio: config.jitter_ratio,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Calculate the delay before retry number `attempt` (1-based).
/// Attempt 0 is the initial call and waits nothing.
pub fn calculate_backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = (policy.base_delay.as_millis() as u64).saturating_mul(exponential_base);
    let capped_ms = delay_ms.min(policy.max_delay.as_millis() as u64);

    // Spread the delay by +/- jitter_ratio to avoid thundering-herd retries
    let spread_ms = (capped_ms as f64 * policy.jitter_ratio) as u64;
    let jittered_ms = if spread_ms > 0 {
        let offset = rand::thread_rng().gen_range(0..=spread_ms * 2);
        (capped_ms + offset).saturating_sub(spread_ms)
    } else {
        capped_ms
    };

    Duration::from_millis(jittered_ms)
}
