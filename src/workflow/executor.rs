//! Topological workflow scheduler: runs ready steps in parallel, bounded
//! by a concurrency semaphore, and propagates outputs to dependents
//! (spec §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{RwLock as AsyncRwLock, Semaphore};
use tokio::task::JoinSet;

use crate::cancellation::CancellationToken;
use crate::clock::{Clock, SharedClock};
use crate::error::CoreError;
use crate::registry::WorkerRegistry;
use crate::resilience::{CircuitBreakerManager, ResilientExecutor, RetryPolicy};
use crate::result::TaskResult;
use crate::task::{Complexity, Criticality, NewTask, Priority, Task, TaskType};
use crate::worker::Role;
use crate::workflow::dag::{StepId, Workflow, WorkflowId, WorkflowStatus, WorkflowStep};

fn task_type_for_role(role: Role) -> TaskType {
    match role {
        Role::Planning => TaskType::Planning,
        Role::Coding => TaskType::CodeGeneration,
        Role::Testing => TaskType::Testing,
        Role::Debugging => TaskType::Debugging,
        Role::Review => TaskType::Review,
        Role::Refactoring => TaskType::Refactoring,
        Role::Documentation => TaskType::Documentation,
        Role::Analysis => TaskType::Analysis,
        Role::Coordination => TaskType::Coordination,
    }
}

/// Owns every workflow submitted to it, keyed by id, and drives each to
/// completion one wave at a time.
pub struct WorkflowExecutor {
    workflows: AsyncRwLock<HashMap<WorkflowId, Workflow>>,
    registry: Arc<WorkerRegistry>,
    breaker_manager: Arc<CircuitBreakerManager>,
    retry_policy: RetryPolicy,
    clock: SharedClock,
    max_concurrent_tasks: usize,
}

impl WorkflowExecutor {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        breaker_manager: Arc<CircuitBreakerManager>,
        retry_policy: RetryPolicy,
        clock: SharedClock,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            workflows: AsyncRwLock::new(HashMap::new()),
            registry,
            breaker_manager,
            retry_policy,
            clock,
            max_concurrent_tasks,
        }
    }

    /// Merges a step's own input with the outputs of its satisfied
    /// dependencies, later-declared dependencies overriding earlier ones
    /// (spec §9 resolution #2).
    fn merge_input(workflow: &Workflow, step: &WorkflowStep) -> HashMap<String, Value> {
        let mut merged = step.input.clone();
        for dep_id in &step.dependencies {
            let Some(result) = workflow.results.get(dep_id) else {
                continue;
            };
            let satisfied = result.success
                || workflow
                    .step(dep_id)
                    .map(|dep_step| dep_step.optional)
                    .unwrap_or(false);
            if satisfied {
                merged.extend(result.output.clone());
            }
        }
        merged
    }

    /// Runs a single step against a freshly picked worker, through the
    /// resilient executor. Never returns an `Err` — a dispatch or
    /// execution failure becomes a failure `TaskResult` so the caller can
    /// always record *some* result under the step id.
    async fn run_step(
        step: WorkflowStep,
        input: HashMap<String, Value>,
        registry: Arc<WorkerRegistry>,
        breaker_manager: Arc<CircuitBreakerManager>,
        retry_policy: RetryPolicy,
        clock: SharedClock,
        cancellation: CancellationToken,
    ) -> (StepId, TaskResult) {
        let candidate = registry
            .list_by_role(step.required_role)
            .into_iter()
            .find(|worker| {
                worker.status() == crate::worker::WorkerStatus::Idle
                    && step.required_capabilities.is_subset(worker.capabilities())
            });

        let worker = match candidate {
            Some(worker) => worker,
            None => {
                tracing::warn!("step {} has no idle worker for role {:?}", step.id, step.required_role);
                let task_id = crate::task::TaskId::new();
                let worker_id = crate::worker::WorkerId::from("none");
                return (
                    step.id,
                    TaskResult::failure(task_id, worker_id, CoreError::NoSuitableWorker.to_string(), &clock),
                );
            }
        };

        let mut task = Task::new(
            NewTask {
                task_type: task_type_for_role(step.required_role),
                title: step.name.clone(),
                description: String::new(),
                priority: Priority::Normal,
                criticality: Criticality::Recoverable,
                complexity: Complexity::Medium,
                required_capabilities: step.required_capabilities.clone(),
                input,
            },
            &clock,
        );

        let breaker = breaker_manager.get_or_create(worker.id());
        let executor = ResilientExecutor::new(&retry_policy, &clock);
        let task_id = task.id;
        let worker_id = worker.id().clone();
        let result = executor
            .run(&mut task, worker, breaker, &cancellation)
            .await
            .unwrap_or_else(|err| TaskResult::failure(task_id, worker_id, err.to_string(), &clock));

        (step.id, result)
    }

    /// Registers `workflow` and runs it to completion. Returns the id on
    /// success; the workflow's own terminal status distinguishes
    /// completion from failure — both are `Ok` here except cancellation,
    /// which is surfaced as `Err(CoreError::Cancelled)`.
    pub async fn execute(
        &self,
        mut workflow: Workflow,
        cancellation: &CancellationToken,
    ) -> Result<WorkflowId, CoreError> {
        workflow.validate_acyclic()?;
        let id = workflow.id;
        tracing::info!("starting workflow {} ({} steps)", id, workflow.steps.len());
        workflow.start(&self.clock);
        {
            let mut workflows = self.workflows.write().await;
            workflows.insert(id, workflow);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_tasks.max(1)));

        loop {
            if cancellation.is_cancelled() {
                let mut workflows = self.workflows.write().await;
                if let Some(wf) = workflows.get_mut(&id) {
                    wf.finish(WorkflowStatus::Cancelled, &self.clock);
                }
                return Err(CoreError::Cancelled);
            }

            let (ready, inputs): (Vec<WorkflowStep>, Vec<HashMap<String, Value>>) = {
                let workflows = self.workflows.read().await;
                let wf = workflows.get(&id).expect("workflow registered by execute");
                let ready: Vec<WorkflowStep> = wf.ready_steps().into_iter().cloned().collect();
                let inputs = ready.iter().map(|step| Self::merge_input(wf, step)).collect();
                (ready, inputs)
            };

            if ready.is_empty() {
                let mut workflows = self.workflows.write().await;
                let wf = workflows.get_mut(&id).expect("workflow registered by execute");
                if wf.is_fully_satisfied() {
                    tracing::info!("workflow {} completed", id);
                    wf.finish(WorkflowStatus::Completed, &self.clock);
                    return Ok(id);
                } else {
                    tracing::warn!("workflow {} failed: unsatisfied dependencies", id);
                    wf.finish(WorkflowStatus::Failed, &self.clock);
                    return Err(CoreError::UnsatisfiedDependencies);
                }
            }

            let mut join_set = JoinSet::new();
            for (step, input) in ready.into_iter().zip(inputs.into_iter()) {
                let registry = self.registry.clone();
                let breaker_manager = self.breaker_manager.clone();
                let retry_policy = self.retry_policy.clone();
                let clock = self.clock.clone();
                let cancellation = cancellation.clone();
                let semaphore = semaphore.clone();
                join_set.spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("workflow semaphore is never closed");
                    Self::run_step(step, input, registry, breaker_manager, retry_policy, clock, cancellation)
                        .await
                });
            }

            let mut outcomes = Vec::new();
            while let Some(outcome) = join_set.join_next().await {
                outcomes.push(outcome.expect("workflow step task panicked"));
            }

            let mut workflows = self.workflows.write().await;
            let wf = workflows.get_mut(&id).expect("workflow registered by execute");
            for (step_id, result) in outcomes {
                wf.results.insert(step_id, result);
            }
        }
    }

    pub async fn get_workflow(&self, id: WorkflowId) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    pub async fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "../tests/workflow_executor_tests.rs"]
mod tests;
