//! Composes a worker call with its circuit breaker and retry policy for a
//! single task (spec §4.6).

use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::clock::Clock;
use crate::error::CoreError;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retry::RetryPolicy;
use crate::result::TaskResult;
use crate::task::Task;
use crate::worker::{Worker, WorkerId};

/// Runs a single task to completion through breaker + retry, mutating the
/// task's status and returning (or synthesizing) its result.
pub struct ResilientExecutor<'a> {
    pub retry_policy: &'a RetryPolicy,
    pub clock: &'a dyn Clock,
}

impl<'a> ResilientExecutor<'a> {
    pub fn new(retry_policy: &'a RetryPolicy, clock: &'a dyn Clock) -> Self {
        Self {
            retry_policy,
            clock,
        }
    }

    /// Executes `task` against `worker`, through `breaker` and this
    /// executor's retry policy.
    ///
    /// 1. `task.start(worker_id)`.
    /// 2. Retries `breaker.call(|| worker.execute(task))` per policy.
    /// 3. On success, completes the task and returns the result.
    /// 4. On exhaustion, fails the task and synthesizes a failure result
    ///    if the worker never returned one.
    pub async fn run(
        &self,
        task: &mut Task,
        worker: Arc<dyn Worker>,
        breaker: Arc<CircuitBreaker>,
        cancellation: &CancellationToken,
    ) -> Result<TaskResult, CoreError> {
        let worker_id: WorkerId = worker.id().clone();
        task.start(worker_id.clone(), self.clock)?;

        let attempt_worker = worker.clone();
        let attempt_breaker = breaker.clone();
        let outcome = self
            .retry_policy
            .retry(cancellation, || {
                let worker = attempt_worker.clone();
                let breaker = attempt_breaker.clone();
                let task_snapshot = task.clone();
                async move { breaker.call(|| async move { worker.execute(&task_snapshot).await }).await }
            })
            .await;

        match outcome {
            Ok(result) => {
                task.complete(result.output.clone(), self.clock)?;
                Ok(result)
            }
            Err(err) => {
                let message = err.to_string();
                task.fail(message.clone(), self.clock)?;
                Ok(TaskResult::failure(task.id, worker_id, message, self.clock))
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/resilient_executor_tests.rs"]
mod tests;
