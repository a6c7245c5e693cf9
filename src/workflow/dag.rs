//! The workflow DAG: steps, dependencies, readiness (spec §4.7).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::clock::{Clock, TimestampUtc};
use crate::error::CoreError;
use crate::result::TaskResult;
use crate::worker::{Capability, Role};

/// Unique identifier for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-assigned identifier for a step, unique within its workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A workflow's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A single node in a workflow's dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: StepId,
    pub name: String,
    pub required_role: Role,
    pub required_capabilities: HashSet<Capability>,
    pub dependencies: Vec<StepId>,
    pub input: HashMap<String, Value>,
    /// A failed result on an optional step is treated by its dependents as
    /// satisfied, same as a success.
    pub optional: bool,
}

impl WorkflowStep {
    pub fn new(id: impl Into<StepId>, name: impl Into<String>, required_role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            required_role,
            required_capabilities: HashSet::new(),
            dependencies: Vec::new(),
            input: HashMap::new(),
            optional: false,
        }
    }

    pub fn with_capabilities(mut self, capabilities: HashSet<Capability>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<StepId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_input(mut self, input: HashMap<String, Value>) -> Self {
        self.input = input;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// An ordered set of steps with dependencies, executed by a
/// [`crate::workflow::WorkflowExecutor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    pub status: WorkflowStatus,
    pub created_at: TimestampUtc,
    pub started_at: Option<TimestampUtc>,
    pub completed_at: Option<TimestampUtc>,
    pub results: HashMap<StepId, TaskResult>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, description: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: WorkflowId::new(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            status: WorkflowStatus::Pending,
            created_at: clock.now(),
            started_at: None,
            completed_at: None,
            results: HashMap::new(),
        }
    }

    /// Appends `step`, rejecting a duplicate id (spec §9 resolution #3).
    pub fn add_step(&mut self, step: WorkflowStep) -> Result<(), CoreError> {
        if self.steps.iter().any(|existing| existing.id == step.id) {
            return Err(CoreError::DuplicateStepId(step.id));
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn step(&self, id: &StepId) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Kahn's-algorithm cycle check over the declared dependency edges.
    /// Dependencies referencing an id not present in the workflow are
    /// ignored here — such a step can simply never become ready, which is
    /// a separate ("unsatisfied dependencies") concern, not a cycle.
    pub fn validate_acyclic(&self) -> Result<(), CoreError> {
        let known: HashSet<&StepId> = self.steps.iter().map(|s| &s.id).collect();
        let mut indegree: HashMap<&StepId, usize> =
            self.steps.iter().map(|s| (&s.id, 0)).collect();
        let mut dependents: HashMap<&StepId, Vec<&StepId>> =
            self.steps.iter().map(|s| (&s.id, Vec::new())).collect();

        for step in &self.steps {
            for dep in &step.dependencies {
                if !known.contains(dep) {
                    continue;
                }
                *indegree.get_mut(&step.id).expect("step indexed") += 1;
                dependents.get_mut(dep).expect("dep indexed").push(&step.id);
            }
        }

        let mut queue: VecDeque<&StepId> = indegree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0usize;

        while let Some(id) = queue.pop_front() {
            visited += 1;
            if let Some(next) = dependents.get(id) {
                for dependent in next {
                    let count = indegree.get_mut(dependent).expect("dependent indexed");
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if visited == self.steps.len() {
            Ok(())
        } else {
            Err(CoreError::CyclicWorkflow)
        }
    }

    /// A step is ready when it has no result of its own yet and every
    /// dependency is satisfied (successful, or failed-but-optional).
    fn is_step_ready(&self, step: &WorkflowStep) -> bool {
        if self.results.contains_key(&step.id) {
            return false;
        }
        step.dependencies.iter().all(|dep_id| {
            match self.results.get(dep_id) {
                Some(result) if result.success => true,
                Some(_) => self
                    .step(dep_id)
                    .map(|dep_step| dep_step.optional)
                    .unwrap_or(false),
                None => false,
            }
        })
    }

    /// Every step that is ready and has no result yet. Order is
    /// unspecified; callers must treat it as a set.
    pub fn ready_steps(&self) -> Vec<&WorkflowStep> {
        self.steps
            .iter()
            .filter(|step| self.is_step_ready(step))
            .collect()
    }

    /// True once every step has a recorded result.
    pub fn all_steps_resolved(&self) -> bool {
        self.steps.iter().all(|step| self.results.contains_key(&step.id))
    }

    /// True iff every step has a result that counts as satisfied: a
    /// success, or a failure on a step marked optional. This is the
    /// condition the executor requires to call a workflow `completed`
    /// rather than `failed` once no step is ready.
    pub fn is_fully_satisfied(&self) -> bool {
        self.steps.iter().all(|step| {
            self.results
                .get(&step.id)
                .map(|result| result.success || step.optional)
                .unwrap_or(false)
        })
    }

    pub fn start(&mut self, clock: &impl Clock) {
        self.status = WorkflowStatus::Running;
        self.started_at = Some(clock.now());
    }

    pub fn finish(&mut self, status: WorkflowStatus, clock: &impl Clock) {
        self.status = status;
        self.completed_at = Some(clock.now());
    }
}

#[cfg(test)]
#[path = "../tests/workflow_dag_tests.rs"]
mod tests;
