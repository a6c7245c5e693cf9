use super::*;
use crate::cancellation::CancellationToken;
use crate::clock::SystemClock;
use crate::echo_worker::{EchoBehavior, EchoWorker};
use crate::resilience::circuit_breaker::{BreakerConfig, CircuitState};
use crate::task::{Complexity, Criticality, NewTask, Priority, Task, TaskStatus, TaskType};
use crate::worker::Role;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn task() -> Task {
    Task::new(
        NewTask {
            task_type: TaskType::CodeGeneration,
            title: "t".into(),
            description: String::new(),
            priority: Priority::Normal,
            criticality: Criticality::Recoverable,
            complexity: Complexity::Low,
            required_capabilities: HashSet::new(),
            input: HashMap::new(),
        },
        &SystemClock,
    )
}

#[tokio::test]
async fn successful_execution_completes_the_task() {
    let worker = Arc::new(EchoWorker::new("w1", Role::Coding, HashSet::new()));
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig::default()));
    let policy = RetryPolicy::default();
    let executor = ResilientExecutor::new(&policy, &SystemClock);
    let mut t = task();
    let cancellation = CancellationToken::none();

    let result = executor.run(&mut t, worker, breaker, &cancellation).await.unwrap();
    assert!(result.success);
    assert_eq!(t.status, TaskStatus::Completed);
}

#[tokio::test]
async fn exhausted_retries_fail_the_task_with_a_synthesized_result() {
    let worker = Arc::new(EchoWorker::with_behaviors(
        "w1",
        Role::Coding,
        HashSet::new(),
        vec![EchoBehavior::Fail("down".into())],
    ));
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 100,
        success_threshold: 2,
        open_timeout: std::time::Duration::from_secs(60),
    }));
    let policy = RetryPolicy {
        max_retries: 1,
        initial_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(1),
        backoff_factor: 1.0,
        allow_list: None,
    };
    let executor = ResilientExecutor::new(&policy, &SystemClock);
    let mut t = task();
    let cancellation = CancellationToken::none();

    let result = executor.run(&mut t, worker.clone(), breaker, &cancellation).await.unwrap();
    assert!(!result.success);
    assert_eq!(t.status, TaskStatus::Failed);
    assert_eq!(worker.invocation_count(), 2);
}

#[tokio::test]
async fn retry_recovers_from_transient_worker_failures() {
    let worker = Arc::new(EchoWorker::with_behaviors(
        "y",
        Role::Coding,
        HashSet::new(),
        vec![
            EchoBehavior::Fail("one".into()),
            EchoBehavior::Fail("two".into()),
            EchoBehavior::Succeed,
        ],
    ));
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 10,
        success_threshold: 2,
        open_timeout: std::time::Duration::from_secs(60),
    }));
    let policy = RetryPolicy {
        max_retries: 5,
        initial_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(1),
        backoff_factor: 1.0,
        allow_list: None,
    };
    let executor = ResilientExecutor::new(&policy, &SystemClock);
    let mut t = task();
    let cancellation = CancellationToken::none();

    let result = executor.run(&mut t, worker.clone(), breaker, &cancellation).await.unwrap();
    assert!(result.success);
    assert_eq!(worker.invocation_count(), 3);
}

#[tokio::test]
async fn breaker_trips_after_successive_failures_and_blocks_the_next_attempt() {
    let worker = Arc::new(EchoWorker::with_behaviors(
        "x",
        Role::Coding,
        HashSet::new(),
        vec![EchoBehavior::Fail("down".into())],
    ));
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 2,
        success_threshold: 2,
        open_timeout: std::time::Duration::from_secs(60),
    }));
    let policy = RetryPolicy {
        max_retries: 0,
        initial_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(1),
        backoff_factor: 1.0,
        allow_list: None,
    };
    let executor = ResilientExecutor::new(&policy, &SystemClock);
    let cancellation = CancellationToken::none();

    let mut first = task();
    executor.run(&mut first, worker.clone(), breaker.clone(), &cancellation).await.unwrap();
    let mut second = task();
    executor.run(&mut second, worker.clone(), breaker.clone(), &cancellation).await.unwrap();
    assert_eq!(breaker.state(), CircuitState::Open);
    let invocations_before_third = worker.invocation_count();

    let mut third = task();
    let result = executor.run(&mut third, worker.clone(), breaker.clone(), &cancellation).await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("circuit breaker is open"));
    assert_eq!(worker.invocation_count(), invocations_before_third);
}
