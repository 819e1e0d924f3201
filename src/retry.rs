//! Exponential backoff shared by the HTTP fetchers and the LLM client.
//!
//! The delay before retry `n` (1-based) is
//!
//! ```text
//! delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use rand::{Rng, rng};
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub base_delay: StdDuration,
    pub max_delay: StdDuration,
    pub max_jitter: StdDuration,
}

impl Backoff {
    /// Schedule used for source HTTP requests: 1s base, 10s cap.
    pub fn for_fetch(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries as usize,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(10),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    /// Schedule used for LLM calls: 5 retries, 1s base, 30s cap.
    pub fn for_llm() -> Self {
        Self {
            max_retries: 5,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    /// Delay before retry `attempt` (1-based), without jitter.
    pub fn base_delay_for(&self, attempt: usize) -> StdDuration {
        let exp = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Delay before retry `attempt` (1-based), with jitter.
    pub fn delay_for(&self, attempt: usize) -> StdDuration {
        let jitter_cap = self.max_jitter.as_millis() as u64;
        let jitter_ms: u64 = if jitter_cap == 0 {
            0
        } else {
            rng().random_range(0..=jitter_cap)
        };
        self.base_delay_for(attempt) + StdDuration::from_millis(jitter_ms)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are used up. The last error is returned.
    pub async fn retry<T, E, F, Fut, R>(&self, what: &str, mut op: F, retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
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

                    if attempt > self.max_retries || !retryable(&e) {
                        error!(
                            what,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "Giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        what,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "Attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
