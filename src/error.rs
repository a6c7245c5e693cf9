//! Error taxonomy for the coordination core.
//!
//! One closed enum for every condition named in the resilience and
//! registry contracts, in the hand-rolled `Display`/`Error` style the
//! domain model uses elsewhere in this crate's lineage (no `thiserror`).

use std::fmt::{self, Display, Formatter};

use crate::task::{TaskId, TaskStatus};
use crate::workflow::StepId;
use crate::worker::WorkerId;

/// Errors raised by the coordination core.
#[derive(Debug, Clone)]
pub enum CoreError {
    /// `WorkerRegistry::register` was asked to store a null worker.
    ///
    /// Unreachable from `register`: `Arc<dyn Worker>` cannot be null in Rust.
    /// Kept for parity with the spec's error taxonomy.
    NilWorker,
    /// No worker is registered under the given id.
    WorkerNotFound(WorkerId),
    /// No task is known under the given id.
    TaskNotFound(TaskId),
    /// No result has been recorded for the given task id.
    ResultNotFound(TaskId),
    /// No idle worker satisfies a task's or step's required capabilities.
    NoSuitableWorker,
    /// The worker's circuit breaker is open; the call was rejected without
    /// invoking the worker.
    CircuitOpen,
    /// Retry attempts were exhausted; wraps the last underlying error.
    MaxRetriesExceeded(Box<CoreError>),
    /// A terminal-state mutation was attempted on a task, result, or workflow.
    IllegalTransition {
        entity: &'static str,
        from: TaskStatus,
        attempted: &'static str,
    },
    /// The operation was cancelled via its cancellation token.
    Cancelled,
    /// A workflow step id collided with one already present in the workflow.
    DuplicateStepId(StepId),
    /// A workflow's step dependency graph contains a cycle.
    CyclicWorkflow,
    /// A non-optional step has a failed result and no further progress is
    /// possible; the workflow is failed.
    UnsatisfiedDependencies,
    /// A worker returned an error of its own type; wrapped so the retry
    /// policy has a single error type to classify.
    WorkerFailure(String),
}

impl CoreError {
    /// Classification tag used by [`crate::resilience::RetryPolicy`] to
    /// decide retryability and to match an optional allow-list.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            CoreError::NilWorker => "nil_worker",
            CoreError::WorkerNotFound(_) => "worker_not_found",
            CoreError::TaskNotFound(_) => "task_not_found",
            CoreError::ResultNotFound(_) => "result_not_found",
            CoreError::NoSuitableWorker => "no_suitable_worker",
            CoreError::CircuitOpen => "circuit_open",
            CoreError::MaxRetriesExceeded(_) => "max_retries_exceeded",
            CoreError::IllegalTransition { .. } => "illegal_transition",
            CoreError::Cancelled => "cancelled",
            CoreError::DuplicateStepId(_) => "duplicate_step_id",
            CoreError::CyclicWorkflow => "cyclic_workflow",
            CoreError::UnsatisfiedDependencies => "unsatisfied_dependencies",
            CoreError::WorkerFailure(_) => "worker_failure",
        }
    }

    /// True for cancellation — never retryable regardless of policy.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NilWorker => write!(f, "cannot register a nil worker"),
            CoreError::WorkerNotFound(id) => write!(f, "worker not found: {}", id),
            CoreError::TaskNotFound(id) => write!(f, "task not found: {}", id),
            CoreError::ResultNotFound(id) => write!(f, "no result recorded for task: {}", id),
            CoreError::NoSuitableWorker => {
                write!(f, "no idle worker satisfies the required capabilities")
            }
            CoreError::CircuitOpen => write!(f, "circuit breaker is open"),
            CoreError::MaxRetriesExceeded(last) => {
                write!(f, "max retries exceeded: {}", last)
            }
            CoreError::IllegalTransition {
                entity,
                from,
                attempted,
            } => write!(
                f,
                "illegal transition on {}: cannot {} from state {:?}",
                entity, attempted, from
            ),
            CoreError::Cancelled => write!(f, "operation cancelled"),
            CoreError::DuplicateStepId(id) => write!(f, "duplicate workflow step id: {}", id),
            CoreError::CyclicWorkflow => write!(f, "workflow step dependency graph is cyclic"),
            CoreError::UnsatisfiedDependencies => {
                write!(f, "workflow failed: unsatisfied dependencies")
            }
            CoreError::WorkerFailure(message) => write!(f, "worker failure: {}", message),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::MaxRetriesExceeded(last) => Some(last.as_ref()),
            _ => None,
        }
    }
}
