//! Bounded retries with exponential backoff for flaky provider calls.

use std::future::Future;
use std::time::Duration;

use narrator_common::config::VoiceDefaults;
use narrator_common::error::NarratorResult;

/// How many times to try a synthesis call and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {

    pub fn from_config(voice: &VoiceDefaults) -> Self {
        Self {
            max_attempts: voice.max_attempts,
            initial_backoff: Duration::from_millis(voice.initial_backoff_ms),
            max_backoff: Duration::from_millis(voice.max_backoff_ms),
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Only errors reporting
    /// [`is_transient`](narrator_common::error::NarratorError::is_transient)
    /// are retried; the returned error carries the attempt count.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> NarratorResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = NarratorResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(label, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.with_attempts(attempt)),
            }
        }
    }
}
