//! Time as an injectable service.
//!
//! Mirrors the source crate's `WorkflowServices`/`WorkflowClock` pattern:
//! domain types ask a `Clock` for the current time rather than calling
//! `Utc::now()` directly, so tests can supply a fixed or step-function
//! clock. Only ordering and elapsed durations between timestamps are
//! contractual — not specific wall-clock values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A UTC timestamp, newtyped for the same reasons the domain model
/// newtypes its other primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampUtc(pub DateTime<Utc>);

impl TimestampUtc {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Elapsed wall-clock duration since `earlier`, or zero if time moved
    /// backward (can happen with an injected test clock misused).
    pub fn duration_since(&self, earlier: &TimestampUtc) -> chrono::Duration {
        self.0.signed_duration_since(earlier.0).max(chrono::Duration::zero())
    }
}

impl std::fmt::Display for TimestampUtc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// A source of current time, injected into tasks, results, and breakers.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimestampUtc;
}

/// Real-time clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampUtc {
        TimestampUtc::now()
    }
}

/// A handle to a shared clock, defaulting to [`SystemClock`].
#[derive(Clone)]
pub struct SharedClock(pub Arc<dyn Clock>);

impl Default for SharedClock {
    fn default() -> Self {
        Self(Arc::new(SystemClock))
    }
}

impl Clock for SharedClock {
    fn now(&self) -> TimestampUtc {
        self.0.now()
    }
}

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
mod tests;
