use super::*;
use crate::clock::SystemClock;
use crate::result::TaskResult;
use crate::task::TaskId;
use crate::worker::WorkerId;

fn workflow() -> Workflow {
    Workflow::new("wf", "desc", &SystemClock)
}

#[test]
fn zero_step_workflow_has_empty_ready_set_and_is_resolved() {
    let wf = workflow();
    assert!(wf.ready_steps().is_empty());
    assert!(wf.all_steps_resolved());
}

#[test]
fn add_step_rejects_a_duplicate_id() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    let err = wf.add_step(WorkflowStep::new("a", "a-again", Role::Planning)).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateStepId(_)));
}

#[test]
fn a_step_with_no_dependencies_is_immediately_ready() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    assert_eq!(wf.ready_steps().len(), 1);
}

#[test]
fn a_step_is_not_ready_until_its_dependency_has_a_result() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    wf.add_step(
        WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]),
    )
    .unwrap();

    let ready: Vec<&StepId> = wf.ready_steps().iter().map(|s| &s.id).collect();
    assert_eq!(ready, vec![&StepId::from("a")]);
}

#[test]
fn a_step_becomes_ready_once_its_dependency_succeeds() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    wf.add_step(
        WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]),
    )
    .unwrap();

    wf.results.insert(
        "a".into(),
        TaskResult::success(TaskId::new(), WorkerId::from("w"), Default::default(), 1.0, &SystemClock),
    );

    let ready: Vec<&StepId> = wf.ready_steps().iter().map(|s| &s.id).collect();
    assert_eq!(ready, vec![&StepId::from("b")]);
}

#[test]
fn a_failed_required_dependency_never_satisfies_its_dependents() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    wf.add_step(
        WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]),
    )
    .unwrap();

    wf.results.insert(
        "a".into(),
        TaskResult::failure(TaskId::new(), WorkerId::from("w"), "boom", &SystemClock),
    );

    assert!(wf.ready_steps().is_empty());
    assert!(!wf.all_steps_resolved());
}

#[test]
fn a_failed_optional_dependency_satisfies_its_dependents() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning).optional()).unwrap();
    wf.add_step(
        WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]),
    )
    .unwrap();

    wf.results.insert(
        "a".into(),
        TaskResult::failure(TaskId::new(), WorkerId::from("w"), "boom", &SystemClock),
    );

    let ready: Vec<&StepId> = wf.ready_steps().iter().map(|s| &s.id).collect();
    assert_eq!(ready, vec![&StepId::from("b")]);
}

#[test]
fn validate_acyclic_accepts_a_linear_chain() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning)).unwrap();
    wf.add_step(WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]))
        .unwrap();
    assert!(wf.validate_acyclic().is_ok());
}

#[test]
fn validate_acyclic_rejects_a_cycle() {
    let mut wf = workflow();
    wf.add_step(WorkflowStep::new("a", "a", Role::Planning).with_dependencies(vec!["b".into()]))
        .unwrap();
    wf.add_step(WorkflowStep::new("b", "b", Role::Coding).with_dependencies(vec!["a".into()]))
        .unwrap();
    assert!(matches!(wf.validate_acyclic(), Err(CoreError::CyclicWorkflow)));
}
