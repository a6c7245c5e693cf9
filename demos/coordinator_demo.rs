//! Registers a planning worker and a coding worker, then runs a two-step
//! workflow (`plan -> code`) through the [`Coordinator`].

use std::collections::HashSet;
use std::sync::Arc;

use agent_coordination_core::{
    CancellationToken, Capability, Coordinator, CoordinatorConfig, EchoWorker, Role, Workflow,
    WorkflowStep,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let coordinator = Coordinator::new(CoordinatorConfig::default());

    let planner = Arc::new(EchoWorker::new(
        "planner-1",
        Role::Planning,
        HashSet::from([Capability::Planning]),
    ));
    let coder = Arc::new(EchoWorker::new(
        "coder-1",
        Role::Coding,
        HashSet::from([Capability::CodeGeneration]),
    ));
    planner.initialize().await.expect("planner initializes");
    coder.initialize().await.expect("coder initializes");

    coordinator
        .register_worker(planner.clone())
        .expect("register planner");
    coordinator
        .register_worker(coder.clone())
        .expect("register coder");

    let clock = agent_coordination_core::SharedClock::default();
    let mut workflow = Workflow::new("ship-feature", "plan then implement", &clock);
    workflow
        .add_step(WorkflowStep::new("plan", "draft a plan", Role::Planning).with_capabilities(HashSet::from([Capability::Planning])))
        .expect("add plan step");
    workflow
        .add_step(
            WorkflowStep::new("code", "implement the plan", Role::Coding)
                .with_capabilities(HashSet::from([Capability::CodeGeneration]))
                .with_dependencies(vec!["plan".into()]),
        )
        .expect("add code step");

    let cancellation = CancellationToken::none();
    let id = coordinator
        .execute_workflow(workflow, &cancellation)
        .await
        .expect("workflow completes");

    let finished = coordinator
        .get_workflow(id)
        .await
        .expect("workflow is tracked by the coordinator");

    println!("workflow {} finished as {:?}", finished.id, finished.status);
    for (step_id, result) in &finished.results {
        println!("  {} -> success={} output={:?}", step_id, result.success, result.output);
    }

    coordinator.shutdown().await.expect("shutdown succeeds");
}
