//! The result model: the single terminal record produced for each task.
//!
//! A [`TaskResult`] is produced exactly once per terminal transition of a
//! [`crate::task::Task`]. It starts in an indeterminate state (created via
//! [`TaskResult::pending`]) and is fixed by exactly one of
//! [`TaskResult::set_success`] / [`TaskResult::set_failure`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::{Clock, TimestampUtc};
use crate::task::TaskId;
use crate::worker::WorkerId;

/// Outcome of a single task execution by a single worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub worker_id: WorkerId,
    pub success: bool,
    pub output: HashMap<String, Value>,
    pub error: Option<String>,
    /// Worker-reported confidence in `[0, 1]`.
    pub confidence: f64,
    pub timestamp: TimestampUtc,
    pub metrics: Option<HashMap<String, Value>>,
}

impl TaskResult {
    /// Creates a result in an indeterminate state (`success = false`,
    /// empty output, no error) that must be fixed with `set_success` or
    /// `set_failure` before it is reported.
    pub fn pending(task_id: TaskId, worker_id: WorkerId, clock: &impl Clock) -> Self {
        Self {
            task_id,
            worker_id,
            success: false,
            output: HashMap::new(),
            error: None,
            confidence: 0.0,
            timestamp: clock.now(),
            metrics: None,
        }
    }

    /// Fixes the result as a success, clamping confidence into `[0, 1]`.
    pub fn set_success(
        &mut self,
        output: HashMap<String, Value>,
        confidence: f64,
        clock: &impl Clock,
    ) {
        self.success = true;
        self.output = output;
        self.error = None;
        self.confidence = confidence.clamp(0.0, 1.0);
        self.timestamp = clock.now();
    }

    /// Fixes the result as a failure.
    pub fn set_failure(&mut self, message: impl Into<String>, clock: &impl Clock) {
        self.success = false;
        self.error = Some(message.into());
        self.confidence = 0.0;
        self.timestamp = clock.now();
    }

    /// Builds an already-successful result in one call.
    pub fn success(
        task_id: TaskId,
        worker_id: WorkerId,
        output: HashMap<String, Value>,
        confidence: f64,
        clock: &impl Clock,
    ) -> Self {
        let mut result = Self::pending(task_id, worker_id, clock);
        result.set_success(output, confidence, clock);
        result
    }

    /// Builds an already-failed result in one call. Used by the resilient
    /// executor to synthesize a result when a worker returns an error
    /// but no result of its own.
    pub fn failure(
        task_id: TaskId,
        worker_id: WorkerId,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let mut result = Self::pending(task_id, worker_id, clock);
        result.set_failure(message, clock);
        result
    }

    pub fn with_metrics(mut self, metrics: HashMap<String, Value>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[cfg(test)]
#[path = "tests/result_tests.rs"]
mod tests;
