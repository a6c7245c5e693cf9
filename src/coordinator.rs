//! The coordinator facade: task submission, single-task execution,
//! workflow execution, and read-only stats (spec §4.9).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::clock::{Clock, SharedClock};
use crate::error::CoreError;
use crate::registry::WorkerRegistry;
use crate::resilience::{BreakerConfig, CircuitBreakerManager, CircuitBreakerStats, ResilientExecutor, RetryPolicy};
use crate::result::TaskResult;
use crate::task::{Task, TaskId, TaskStatus};
use crate::worker::{Role, Worker, WorkerHealth, WorkerId, WorkerStatus};
use crate::workflow::{Workflow, WorkflowExecutor, WorkflowId};

/// Tunables for a [`Coordinator`], all defaulted per spec §4.9.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Upper bound on in-flight tasks per coordinator, and the per-wave
    /// concurrency cap its [`WorkflowExecutor`] uses.
    pub max_concurrent_tasks: usize,
    pub task_timeout: Duration,
    /// Turns the breaker+retry layer on or off for `execute_task`.
    /// Workflow step execution always goes through the resilient
    /// executor, since the breaker-per-worker bookkeeping it maintains is
    /// shared across both entry points.
    pub enable_resilience: bool,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub circuit_breaker_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            task_timeout: Duration::from_secs(30 * 60),
            enable_resilience: true,
            failure_threshold: 5,
            success_threshold: 2,
            circuit_breaker_timeout: Duration::from_secs(60),
        }
    }
}

/// Per-worker snapshot returned by [`Coordinator::worker_stats`] (spec §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerStatsSnapshot {
    pub role: Role,
    pub status: WorkerStatus,
    pub health: WorkerHealth,
}

/// Facade tying the registry, resilience layer, and workflow executor
/// together. Holds no process-wide state — callers own their own
/// `Coordinator` value (spec §9: "no process-wide state is required").
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: Arc<WorkerRegistry>,
    breaker_manager: Arc<CircuitBreakerManager>,
    retry_policy: RetryPolicy,
    workflow_executor: WorkflowExecutor,
    clock: SharedClock,
    tasks: RwLock<HashMap<TaskId, Task>>,
    results: RwLock<HashMap<TaskId, TaskResult>>,
    queue: Mutex<VecDeque<TaskId>>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::with_clock(config, SharedClock::default())
    }

    pub fn with_clock(config: CoordinatorConfig, clock: SharedClock) -> Self {
        let registry = Arc::new(WorkerRegistry::new());
        let breaker_manager = Arc::new(CircuitBreakerManager::new(BreakerConfig {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            open_timeout: config.circuit_breaker_timeout,
        }));
        let workflow_executor = WorkflowExecutor::new(
            registry.clone(),
            breaker_manager.clone(),
            RetryPolicy::default(),
            clock.clone(),
            config.max_concurrent_tasks,
        );
        Self {
            config,
            registry,
            breaker_manager,
            retry_policy: RetryPolicy::default(),
            workflow_executor,
            clock,
            tasks: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn register_worker(&self, worker: Arc<dyn Worker>) -> Result<(), CoreError> {
        self.registry.register(worker)
    }

    /// Stores `task` and appends it to the submission queue.
    pub fn submit_task(&self, task: Task) -> Result<TaskId, CoreError> {
        let id = task.id;
        self.tasks
            .write()
            .expect("task map lock poisoned")
            .insert(id, task);
        self.queue.lock().expect("queue lock poisoned").push_back(id);
        Ok(id)
    }

    /// Walks the registry for the first idle worker that can handle `task`.
    fn find_suitable_worker(&self, task: &Task) -> Result<Arc<dyn Worker>, CoreError> {
        self.registry
            .list()
            .into_iter()
            .find(|worker| worker.status() == WorkerStatus::Idle && worker.can_handle(task))
            .ok_or(CoreError::NoSuitableWorker)
    }

    /// Looks up the task, finds an idle capable worker, and runs it
    /// through the resilient executor when `enable_resilience` is set or
    /// directly otherwise. Stores and returns the result.
    ///
    /// Bounds `cancellation` by `config.task_timeout`: the task is also
    /// cancelled if the deadline elapses before the caller cancels it
    /// itself (spec §4.9/§5).
    pub async fn execute_task(
        &self,
        id: TaskId,
        cancellation: &CancellationToken,
    ) -> Result<TaskResult, CoreError> {
        let cancellation = cancellation.bounded(self.config.task_timeout);
        let cancellation = &cancellation;
        let mut task = self
            .tasks
            .read()
            .expect("task map lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(CoreError::TaskNotFound(id))?;

        let worker = match self.find_suitable_worker(&task) {
            Ok(worker) => worker,
            Err(err) => {
                tracing::warn!("task {} has no suitable idle worker", id);
                return Err(err);
            }
        };

        let result = if self.config.enable_resilience {
            let breaker = self.breaker_manager.get_or_create(worker.id());
            let executor = ResilientExecutor::new(&self.retry_policy, &self.clock);
            executor.run(&mut task, worker, breaker, cancellation).await?
        } else {
            let worker_id = worker.id().clone();
            task.start(worker_id.clone(), &self.clock)?;
            match worker.execute(&task).await {
                Ok(result) => {
                    task.complete(result.output.clone(), &self.clock)?;
                    result
                }
                Err(err) => {
                    let message = err.to_string();
                    task.fail(message.clone(), &self.clock)?;
                    TaskResult::failure(task.id, worker_id, message, &self.clock)
                }
            }
        };

        self.tasks
            .write()
            .expect("task map lock poisoned")
            .insert(id, task);
        self.results
            .write()
            .expect("result map lock poisoned")
            .insert(id, result.clone());
        Ok(result)
    }

    /// Bounds `cancellation` by `config.task_timeout`, same as
    /// `execute_task` — a workflow run is cancelled if the deadline
    /// elapses before the caller cancels it itself.
    pub async fn execute_workflow(
        &self,
        workflow: Workflow,
        cancellation: &CancellationToken,
    ) -> Result<WorkflowId, CoreError> {
        let cancellation = cancellation.bounded(self.config.task_timeout);
        self.workflow_executor.execute(workflow, &cancellation).await
    }

    pub fn get_task_status(&self, id: TaskId) -> Result<TaskStatus, CoreError> {
        self.tasks
            .read()
            .expect("task map lock poisoned")
            .get(&id)
            .map(|task| task.status)
            .ok_or(CoreError::TaskNotFound(id))
    }

    pub fn get_result(&self, id: TaskId) -> Result<TaskResult, CoreError> {
        self.results
            .read()
            .expect("result map lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(CoreError::ResultNotFound(id))
    }

    pub fn list_workers(&self) -> Vec<Arc<dyn Worker>> {
        self.registry.list()
    }

    pub fn worker_stats(&self) -> HashMap<WorkerId, WorkerStatsSnapshot> {
        self.registry
            .list()
            .into_iter()
            .map(|worker| {
                (
                    worker.id().clone(),
                    WorkerStatsSnapshot {
                        role: worker.role(),
                        status: worker.status(),
                        health: worker.health(),
                    },
                )
            })
            .collect()
    }

    pub fn circuit_breaker_stats(&self) -> HashMap<WorkerId, CircuitBreakerStats> {
        self.breaker_manager.stats()
    }

    pub async fn get_workflow(&self, id: WorkflowId) -> Option<Workflow> {
        self.workflow_executor.get_workflow(id).await
    }

    pub async fn list_workflows(&self) -> Vec<Workflow> {
        self.workflow_executor.list_workflows().await
    }

    /// Shuts down every registered worker, returning the first error
    /// encountered, if any. All workers are asked to shut down regardless
    /// of earlier failures.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        let mut first_error = None;
        for worker in self.registry.list() {
            if let Err(err) = worker.shutdown().await {
                tracing::warn!("worker {} failed to shut down: {}", worker.id(), err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
