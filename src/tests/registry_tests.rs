use super::*;
use crate::echo_worker::EchoWorker;
use std::collections::HashSet;

fn worker(id: &str, role: Role) -> Arc<EchoWorker> {
    Arc::new(EchoWorker::new(id, role, HashSet::new()))
}

#[test]
fn register_then_get_returns_the_same_worker() {
    let registry = WorkerRegistry::new();
    let w = worker("w1", Role::Planning);
    registry.register(w.clone()).unwrap();
    let fetched = registry.get(&WorkerId::from("w1")).unwrap();
    assert_eq!(fetched.id(), w.id());
}

#[test]
fn get_on_unknown_id_returns_worker_not_found() {
    let registry = WorkerRegistry::new();
    assert!(matches!(
        registry.get(&WorkerId::from("missing")),
        Err(CoreError::WorkerNotFound(_))
    ));
}

#[test]
fn register_then_unregister_then_get_is_worker_not_found() {
    let registry = WorkerRegistry::new();
    let w = worker("w1", Role::Planning);
    registry.register(w.clone()).unwrap();
    registry.unregister(w.id());
    assert!(matches!(
        registry.get(w.id()),
        Err(CoreError::WorkerNotFound(_))
    ));
}

#[test]
fn unregister_on_absent_id_is_a_no_op() {
    let registry = WorkerRegistry::new();
    registry.unregister(&WorkerId::from("nope"));
    assert_eq!(registry.count(), 0);
}

#[test]
fn register_under_same_id_replaces_the_prior_entry() {
    let registry = WorkerRegistry::new();
    registry.register(worker("w1", Role::Planning)).unwrap();
    registry.register(worker("w1", Role::Coding)).unwrap();
    assert_eq!(registry.count(), 1);
    assert_eq!(registry.get(&WorkerId::from("w1")).unwrap().role(), Role::Coding);
}

#[test]
fn list_by_role_filters_to_matching_workers() {
    let registry = WorkerRegistry::new();
    registry.register(worker("planner", Role::Planning)).unwrap();
    registry.register(worker("coder", Role::Coding)).unwrap();
    let planners = registry.list_by_role(Role::Planning);
    assert_eq!(planners.len(), 1);
    assert_eq!(planners[0].id(), &WorkerId::from("planner"));
}

#[test]
fn list_by_capability_filters_workers_declaring_it() {
    let registry = WorkerRegistry::new();
    registry.register(Arc::new(EchoWorker::new(
        "a",
        Role::Coding,
        HashSet::from([Capability::CodeGeneration]),
    ))).unwrap();
    registry.register(Arc::new(EchoWorker::new("b", Role::Testing, HashSet::from([Capability::TestExecution])))).unwrap();

    let generators = registry.list_by_capability(Capability::CodeGeneration);
    assert_eq!(generators.len(), 1);
    assert_eq!(generators[0].id(), &WorkerId::from("a"));
}

#[test]
fn count_and_list_reflect_all_registered_workers() {
    let registry = WorkerRegistry::new();
    registry.register(worker("a", Role::Planning)).unwrap();
    registry.register(worker("b", Role::Coding)).unwrap();
    assert_eq!(registry.count(), 2);
    assert_eq!(registry.list().len(), 2);
}
