//! Exponential-backoff retry with classification of retryable errors
//! (spec §4.5).

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::error::CoreError;

/// Retry configuration. `max_retries` additional attempts are made after
/// the first, for `max_retries + 1` total attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// When set, only errors whose [`CoreError::kind_tag`] is listed are
    /// retried; when `None`, every non-cancellation error is retried.
    pub allow_list: Option<HashSet<&'static str>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            allow_list: None,
        }
    }
}

impl RetryPolicy {
    /// Cancellation is never retried. With no allow-list, every other
    /// error is retried; with one, only listed kinds are.
    pub fn should_retry(&self, err: &CoreError) -> bool {
        if err.is_cancellation() {
            return false;
        }
        match &self.allow_list {
            Some(allowed) => allowed.contains(err.kind_tag()),
            None => true,
        }
    }

    /// Delay after the failure at `attempt` (0-indexed: the delay after
    /// the *first* failure uses `attempt = 0`).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Calls `op` until it succeeds, a non-retryable error is returned, or
    /// `max_retries + 1` total attempts have been made, whichever comes
    /// first. Cancellation during a backoff sleep returns `Cancelled`
    /// immediately — the attempt count at that point stands.
    pub async fn retry<F, Fut, T>(
        &self,
        cancellation: &CancellationToken,
        mut op: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            if cancellation.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.should_retry(&err) {
                        return Err(err);
                    }
                    if attempt >= self.max_retries {
                        tracing::warn!("retry exhausted after {} attempts: {}", attempt + 1, err);
                        return Err(CoreError::MaxRetriesExceeded(Box::new(err)));
                    }
                    let delay = self.delay_for(attempt);
                    tracing::debug!("attempt {} failed ({}), retrying after {:?}", attempt + 1, err, delay);
                    attempt += 1;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancellation.cancelled() => {
                            return Err(CoreError::Cancelled);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/retry_tests.rs"]
mod tests;
