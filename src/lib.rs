//! Agent Coordination Core.
//!
//! A capability-typed worker registry, a dependency-DAG workflow
//! executor, and a per-worker resilience layer (circuit breaker +
//! exponential-backoff retry) that together decide when and where tasks
//! run and how failures are absorbed.
//!
//! This crate defines no UI, CLI, configuration format, LLM provider
//! adapter, storage engine, or concrete worker implementation beyond the
//! minimal [`worker::Worker`] trait and the [`echo_worker::EchoWorker`]
//! test scaffold — callers embed this crate and supply their own.

pub mod cancellation;
pub mod clock;
pub mod coordinator;
#[cfg(any(test, feature = "test-support"))]
pub mod echo_worker;
pub mod error;
pub mod registry;
pub mod resilience;
pub mod result;
pub mod task;
pub mod worker;
pub mod workflow;

pub use cancellation::CancellationToken;
pub use clock::{Clock, SharedClock, SystemClock, TimestampUtc};
pub use coordinator::{Coordinator, CoordinatorConfig, WorkerStatsSnapshot};
#[cfg(any(test, feature = "test-support"))]
pub use echo_worker::{EchoBehavior, EchoWorker};
pub use error::CoreError;
pub use registry::WorkerRegistry;
pub use resilience::{BreakerConfig, CircuitBreaker, CircuitBreakerManager, CircuitBreakerStats, CircuitState, ResilientExecutor, RetryPolicy};
pub use result::TaskResult;
pub use task::{Complexity, Criticality, NewTask, Priority, Task, TaskId, TaskStatus, TaskType};
pub use worker::{Capability, CollaborationResult, Role, Worker, WorkerHealth, WorkerId, WorkerMetrics, WorkerStatus};
pub use workflow::{StepId, Workflow, WorkflowExecutor, WorkflowId, WorkflowStatus, WorkflowStep};
