//! The task model: a unit of work scheduled by the coordinator.
//!
//! Status transitions are monotone (`pending -> assigned -> running ->
//! {completed|failed|cancelled}`; `paused` and `retrying` may interleave
//! with `running`). Once a task reaches a terminal state its output and
//! error are frozen — every mutator below rejects a terminal-state call
//! with `CoreError::IllegalTransition`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::clock::{Clock, SharedClock, TimestampUtc};
use crate::error::CoreError;
use crate::worker::{Capability, WorkerId};

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Planning,
    CodeGeneration,
    Testing,
    Debugging,
    Review,
    Refactoring,
    Documentation,
    Analysis,
    Coordination,
}

/// Scheduling priority, ordered `Low < Normal < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

/// How badly a task's failure affects the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    NonCritical,
    Recoverable,
    Critical,
    Catastrophic,
}

/// Rough estimate of how much work a task requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// A task's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Running,
    Completed,
    Failed,
    Cancelled,
    Paused,
    Retrying,
}

impl TaskStatus {
    /// Terminal states freeze output/error and reject further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A unit of work scheduled by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub criticality: Criticality,
    pub complexity: Complexity,
    pub required_capabilities: HashSet<Capability>,
    pub input: HashMap<String, Value>,
    pub assigned_worker: Option<WorkerId>,
    pub status: TaskStatus,
    pub created_at: TimestampUtc,
    pub started_at: Option<TimestampUtc>,
    pub completed_at: Option<TimestampUtc>,
    pub output: HashMap<String, Value>,
    pub error: Option<String>,
}

/// Construction parameters for a new task; everything not listed here
/// defaults (empty capability set, empty input, `Pending` status).
pub struct NewTask {
    pub task_type: TaskType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub criticality: Criticality,
    pub complexity: Complexity,
    pub required_capabilities: HashSet<Capability>,
    pub input: HashMap<String, Value>,
}

impl Task {
    /// Creates a new task in `Pending` status, timestamped by `clock`.
    pub fn new(params: NewTask, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            task_type: params.task_type,
            title: params.title,
            description: params.description,
            priority: params.priority,
            criticality: params.criticality,
            complexity: params.complexity,
            required_capabilities: params.required_capabilities,
            input: params.input,
            assigned_worker: None,
            status: TaskStatus::Pending,
            created_at: clock.now(),
            started_at: None,
            completed_at: None,
            output: HashMap::new(),
            error: None,
        }
    }

    /// Creates a task using the default real-time clock. Convenience for
    /// callers that don't need a fixed clock in tests.
    pub fn with_defaults(params: NewTask) -> Self {
        Self::new(params, &SharedClock::default())
    }

    fn reject(&self, attempted: &'static str) -> CoreError {
        CoreError::IllegalTransition {
            entity: "Task",
            from: self.status,
            attempted,
        }
    }

    /// `pending|assigned -> running`. Sets `assigned_worker` and `started_at`.
    pub fn start(&mut self, worker_id: WorkerId, clock: &impl Clock) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("start"));
        }
        match self.status {
            TaskStatus::Pending | TaskStatus::Assigned => {
                self.assigned_worker = Some(worker_id);
                self.status = TaskStatus::Running;
                self.started_at = Some(clock.now());
                Ok(())
            }
            _ => Err(self.reject("start")),
        }
    }

    /// `pending -> assigned`, without starting execution yet.
    pub fn assign(&mut self, worker_id: WorkerId) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("assign"));
        }
        match self.status {
            TaskStatus::Pending => {
                self.assigned_worker = Some(worker_id);
                self.status = TaskStatus::Assigned;
                Ok(())
            }
            _ => Err(self.reject("assign")),
        }
    }

    /// `running -> completed`. Freezes `output`.
    pub fn complete(
        &mut self,
        output: HashMap<String, Value>,
        clock: &impl Clock,
    ) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("complete"));
        }
        match self.status {
            TaskStatus::Running | TaskStatus::Retrying => {
                self.output = output;
                self.status = TaskStatus::Completed;
                self.completed_at = Some(clock.now());
                Ok(())
            }
            _ => Err(self.reject("complete")),
        }
    }

    /// `running -> failed`. Freezes `error`.
    pub fn fail(&mut self, message: impl Into<String>, clock: &impl Clock) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("fail"));
        }
        match self.status {
            TaskStatus::Running | TaskStatus::Retrying | TaskStatus::Pending | TaskStatus::Assigned => {
                self.error = Some(message.into());
                self.status = TaskStatus::Failed;
                self.completed_at = Some(clock.now());
                Ok(())
            }
            _ => Err(self.reject("fail")),
        }
    }

    /// Any non-terminal state `-> cancelled`.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("cancel"));
        }
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(clock.now());
        Ok(())
    }

    /// `running -> paused`.
    pub fn pause(&mut self) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("pause"));
        }
        match self.status {
            TaskStatus::Running => {
                self.status = TaskStatus::Paused;
                Ok(())
            }
            _ => Err(self.reject("pause")),
        }
    }

    /// `paused -> running`.
    pub fn resume(&mut self) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("resume"));
        }
        match self.status {
            TaskStatus::Paused => {
                self.status = TaskStatus::Running;
                Ok(())
            }
            _ => Err(self.reject("resume")),
        }
    }

    /// `failed -> retrying` transitional marker used by the resilient
    /// executor between retry attempts. Note `retrying` is not terminal
    /// and may transition back to `running` via [`Task::start`]-equivalent
    /// bookkeeping done by the caller.
    pub fn mark_retrying(&mut self) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.reject("mark_retrying"));
        }
        self.status = TaskStatus::Retrying;
        Ok(())
    }

    /// Elapsed duration between start and completion, if both are set.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.duration_since(&start)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/task_tests.rs"]
mod tests;
