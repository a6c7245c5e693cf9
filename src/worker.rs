//! The worker contract: the minimal capability interface every executor
//! must satisfy, plus the atomics-backed counters a concrete
//! implementation embeds to keep health reporting thread-safe.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::result::TaskResult;
use crate::task::Task;

/// Caller-assigned, stable worker identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed capability enumeration a task requires and a worker declares.
/// Matching is subset-inclusion: a worker can handle a task iff every
/// capability the task requires is present in the worker's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Planning,
    CodeGeneration,
    CodeAnalysis,
    TestGeneration,
    TestExecution,
    Debugging,
    Refactoring,
    Documentation,
    CodeReview,
    SecurityAudit,
    PerformanceAnalysis,
}

/// Coarser role tag attached to a worker and requested by a workflow step.
/// Closed, one level coarser than [`Capability`] — see DESIGN.md for why
/// it parallels `TaskType` rather than `Capability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Planning,
    Coding,
    Testing,
    Debugging,
    Review,
    Refactoring,
    Documentation,
    Analysis,
    Coordination,
}

/// A worker's current disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Busy,
    Waiting,
    Error,
    Shutdown,
}

/// A point-in-time snapshot of a worker's health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerHealth {
    pub uptime: Duration,
    pub task_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub healthy: bool,
}

/// The minimal capability contract every worker implementation satisfies.
#[async_trait]
pub trait Worker: Send + Sync {
    fn id(&self) -> &WorkerId;
    fn role(&self) -> Role;
    fn name(&self) -> &str;
    fn capabilities(&self) -> &HashSet<Capability>;
    fn status(&self) -> WorkerStatus;
    fn health(&self) -> WorkerHealth;

    /// True iff every capability the task requires is present in this
    /// worker's capability set. A task with no declared requirements is
    /// accepted by every worker.
    fn can_handle(&self, task: &Task) -> bool {
        task.required_capabilities.is_subset(self.capabilities())
    }

    async fn initialize(&self) -> Result<(), CoreError>;
    async fn execute(&self, task: &Task) -> Result<TaskResult, CoreError>;
    async fn collaborate(
        &self,
        peers: &[Arc<dyn Worker>],
        task: &Task,
    ) -> Result<CollaborationResult, CoreError>;
    async fn shutdown(&self) -> Result<(), CoreError>;
}

/// Outcome of a multi-worker collaboration on a single task.
#[derive(Debug, Clone, Default)]
pub struct CollaborationResult {
    pub output: std::collections::HashMap<String, serde_json::Value>,
    pub contributors: Vec<WorkerId>,
}

/// Thread-safe counters and status a concrete [`Worker`] implementation
/// embeds. `taskCount`/`errorCount`/`status` must update atomically
/// (spec §4.2); this is the shared implementation of that requirement.
pub struct WorkerMetrics {
    task_count: AtomicU64,
    error_count: AtomicU64,
    status: Mutex<WorkerStatus>,
    started_at: Instant,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self {
            task_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            status: Mutex::new(WorkerStatus::Idle),
            started_at: Instant::now(),
        }
    }

    pub fn set_status(&self, status: WorkerStatus) {
        let mut guard = self.status.lock().expect("worker status mutex poisoned");
        *guard = status;
    }

    pub fn status(&self) -> WorkerStatus {
        *self.status.lock().expect("worker status mutex poisoned")
    }

    /// Records a completed task. `success = false` also increments the
    /// error counter.
    pub fn record_completion(&self, success: bool) {
        self.task_count.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.error_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Snapshot consistent with the counters at the moment of the call.
    /// `healthy <=> status not in {error, shutdown} and error_rate < 0.2`.
    pub fn health(&self) -> WorkerHealth {
        let task_count = self.task_count.load(Ordering::SeqCst);
        let error_count = self.error_count.load(Ordering::SeqCst);
        let error_rate = error_count as f64 / task_count.max(1) as f64;
        let status = self.status();
        let healthy =
            !matches!(status, WorkerStatus::Error | WorkerStatus::Shutdown) && error_rate < 0.2;

        WorkerHealth {
            uptime: self.started_at.elapsed(),
            task_count,
            error_count,
            error_rate,
            healthy,
        }
    }
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
mod tests;
