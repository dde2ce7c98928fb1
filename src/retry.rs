//! Exponential backoff with jitter for fallible async operations.
//!
//! The delay before retry `n` (1-based) is:
//!
//! ```text
//! delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=250ms)
//! ```
//!
//! The jitter keeps parallel callers that failed together from retrying in
//! lockstep.

use rand::{Rng, rng};
use serde::Deserialize;
use std::error::Error;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        let delay = Duration::from_millis(self.base_delay_ms).saturating_mul(1 << shift);
        delay.min(Duration::from_millis(self.max_delay_ms))
    }
}

/// Run `op` until it succeeds or the policy's retries are exhausted.
///
/// `label` names the operation in log events. The last error is returned when
/// every attempt fails.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, Box<dyn Error>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Box<dyn Error>>>,
{
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        let attempt_t0 = Instant::now();
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                let attempt_dt = attempt_t0.elapsed();
                let total_dt = total_t0.elapsed();

                if attempt > policy.max_retries {
                    error!(
                        label,
                        attempt,
                        max = policy.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        error = %e,
                        "exhausted retries"
                    );
                    return Err(e);
                }

                let jitter_ms: u64 = rng().random_range(0..=250);
                let delay = policy.backoff(attempt) + Duration::from_millis(jitter_ms);

                warn!(
                    label,
                    attempt,
                    max = policy.max_retries,
                    elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                    elapsed_ms_total = total_dt.as_millis() as u64,
                    ?delay,
                    error = %e,
                    "attempt failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}
