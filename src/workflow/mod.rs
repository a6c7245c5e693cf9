//! Workflow DAG model and its wave-based executor (spec §4.7-4.8).

mod dag;
mod executor;

pub use dag::{StepId, Workflow, WorkflowId, WorkflowStatus, WorkflowStep};
pub use executor::WorkflowExecutor;
