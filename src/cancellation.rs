//! Cooperative cancellation token.
//!
//! Every public operation in this crate accepts a [`CancellationToken`]
//! (spec §5: "every public operation accepts a cancellation/deadline
//! token"). A timeout is just cancellation with a bound — there is no
//! separate timeout mechanism (spec §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cheaply cloneable cooperative cancellation signal.
#[derive(Clone)]
pub struct CancellationToken(Arc<Inner>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }))
    }

    /// A token that is never cancelled, for callers with no deadline.
    pub fn none() -> Self {
        Self::new()
    }

    /// Signals cancellation; wakes every pending `cancelled()` waiter.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        loop {
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
            if self.is_cancelled() {
                return;
            }
        }
    }

    /// Spawns a companion token that cancels itself after `timeout` elapses,
    /// in addition to propagating an explicit `cancel()` on either token's
    /// parent. Used by callers that want a per-task deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        let spawned = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            spawned.cancel();
        });
        token
    }

    /// Derives a child token that cancels when `self` cancels or when
    /// `timeout` elapses, whichever comes first. This is how a per-task
    /// deadline (spec §5: "timeouts are cancellation with a bound") is
    /// combined with a caller-supplied token without mutating it.
    pub fn bounded(&self, timeout: Duration) -> Self {
        let derived = Self::new();
        let parent = self.clone();
        let child = derived.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = parent.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {}
            }
            child.cancel();
        });
        derived
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/cancellation_tests.rs"]
mod tests;
