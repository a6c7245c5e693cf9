//! A worker that performs no real work, used to exercise the registry,
//! breaker, retry, and workflow executor in this crate's own tests and in
//! `demos/coordinator_demo.rs`. Not a product feature (spec §4.2).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::clock::SharedClock;
use crate::error::CoreError;
use crate::result::TaskResult;
use crate::task::Task;
use crate::worker::{Capability, CollaborationResult, Role, Worker, WorkerHealth, WorkerId, WorkerMetrics, WorkerStatus};

use std::collections::HashSet;

/// Scripted response an [`EchoWorker`] gives for the next `execute` call.
#[derive(Debug, Clone)]
pub enum EchoBehavior {
    /// Succeeds, echoing the task's input back as output.
    Succeed,
    /// Fails with the given message.
    Fail(String),
}

/// A minimal [`Worker`] that echoes its input back as output (or fails,
/// per its configured [`EchoBehavior`] sequence), without performing any
/// real work. Behaviors are consumed in order; once exhausted, the
/// worker repeats its last behavior indefinitely.
pub struct EchoWorker {
    id: WorkerId,
    role: Role,
    name: String,
    capabilities: HashSet<Capability>,
    metrics: WorkerMetrics,
    clock: SharedClock,
    behaviors: Mutex<Vec<EchoBehavior>>,
    invocations: Mutex<u64>,
}

impl EchoWorker {
    pub fn new(id: impl Into<WorkerId>, role: Role, capabilities: HashSet<Capability>) -> Self {
        Self::with_behaviors(id, role, capabilities, vec![EchoBehavior::Succeed])
    }

    pub fn with_behaviors(
        id: impl Into<WorkerId>,
        role: Role,
        capabilities: HashSet<Capability>,
        behaviors: Vec<EchoBehavior>,
    ) -> Self {
        let id = id.into();
        Self {
            name: format!("echo-{}", id),
            id,
            role,
            capabilities,
            metrics: WorkerMetrics::new(),
            clock: SharedClock::default(),
            behaviors: Mutex::new(behaviors),
            invocations: Mutex::new(0),
        }
    }

    /// Total number of times `execute` has been called.
    pub fn invocation_count(&self) -> u64 {
        *self.invocations.lock().expect("invocation counter lock poisoned")
    }

    fn next_behavior(&self) -> EchoBehavior {
        let mut behaviors = self.behaviors.lock().expect("behavior queue lock poisoned");
        if behaviors.len() > 1 {
            behaviors.remove(0)
        } else {
            behaviors
                .first()
                .cloned()
                .unwrap_or(EchoBehavior::Succeed)
        }
    }
}

#[async_trait]
impl Worker for EchoWorker {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    fn role(&self) -> Role {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &HashSet<Capability> {
        &self.capabilities
    }

    fn status(&self) -> WorkerStatus {
        self.metrics.status()
    }

    fn health(&self) -> WorkerHealth {
        self.metrics.health()
    }

    async fn initialize(&self) -> Result<(), CoreError> {
        self.metrics.set_status(WorkerStatus::Idle);
        Ok(())
    }

    async fn execute(&self, task: &Task) -> Result<TaskResult, CoreError> {
        *self.invocations.lock().expect("invocation counter lock poisoned") += 1;
        self.metrics.set_status(WorkerStatus::Busy);
        let outcome = match self.next_behavior() {
            EchoBehavior::Succeed => {
                let output: HashMap<String, Value> = task.input.clone();
                Ok(TaskResult::success(task.id, self.id.clone(), output, 1.0, &self.clock))
            }
            EchoBehavior::Fail(message) => Err(CoreError::WorkerFailure(message)),
        };
        self.metrics.record_completion(outcome.is_ok());
        self.metrics.set_status(WorkerStatus::Idle);
        outcome
    }

    async fn collaborate(
        &self,
        _peers: &[Arc<dyn Worker>],
        task: &Task,
    ) -> Result<CollaborationResult, CoreError> {
        Ok(CollaborationResult {
            output: task.input.clone(),
            contributors: vec![self.id.clone()],
        })
    }

    async fn shutdown(&self) -> Result<(), CoreError> {
        self.metrics.set_status(WorkerStatus::Shutdown);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/echo_worker_tests.rs"]
mod tests;
