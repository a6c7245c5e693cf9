//! Per-worker three-state circuit breaker (spec §4.4).
//!
//! ```text
//!          failureCount>=T_fail              open-timeout elapsed
//!  closed ─────────────────────▶ open ─────────────────────▶ half_open
//!    ▲                                                            │
//!    │  successCount>=T_succ in half_open                         │
//!    └────────────────────────────────────────────────────────────┘
//!                                                     any failure in half_open
//!                                                reverts half_open -> open
//! ```

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::CoreError;

/// Breaker state. It is impossible to reach `Closed` from `Open` without
/// passing through `HalfOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Tunables for a single breaker.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout: Duration::from_secs(60),
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

/// A snapshot of a breaker's state, for observability (spec §6,
/// `GetCircuitBreakerStats`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
}

/// Serializes all state reads and writes for a single worker's breaker.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

enum Decision {
    Proceed,
    RejectOpen,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock().expect("breaker lock poisoned");
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    /// Unconditionally transitions to `closed` with both counters at zero.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.last_failure = None;
    }

    /// Decides whether to let a call proceed, transitioning `open ->
    /// half_open` if the open-timeout has elapsed. Must not invoke `op`
    /// itself — that happens outside the lock, per spec §5's leaf-lock rule.
    fn admit(&self) -> Decision {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => Decision::Proceed,
            CircuitState::HalfOpen => Decision::Proceed,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|t| t.elapsed() >= self.config.open_timeout)
                    .unwrap_or(false);
                if elapsed {
                    tracing::debug!("circuit breaker open-timeout elapsed, probing half-open");
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    Decision::Proceed
                } else {
                    Decision::RejectOpen
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    tracing::info!("circuit breaker closing after {} half-open successes", inner.success_count);
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    tracing::warn!("circuit breaker opening after {} failures", inner.failure_count);
                    inner.state = CircuitState::Open;
                    inner.last_failure = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!("circuit breaker reverting to open after a half-open failure");
                inner.state = CircuitState::Open;
                inner.last_failure = Some(Instant::now());
                inner.success_count = 0;
            }
            CircuitState::Open => {
                inner.last_failure = Some(Instant::now());
            }
        }
    }

    /// Runs `op` through the breaker. Rejects with `CircuitOpen` without
    /// invoking `op` when the breaker is open and its timeout has not yet
    /// elapsed. A `CircuitOpen` rejection does not count as a worker
    /// failure for breaker accounting — the breaker itself decided the
    /// outcome.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        match self.admit() {
            Decision::RejectOpen => Err(CoreError::CircuitOpen),
            Decision::Proceed => {
                let result = op().await;
                match &result {
                    Ok(_) => self.record_success(),
                    Err(_) => self.record_failure(),
                }
                result
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/circuit_breaker_tests.rs"]
mod tests;
