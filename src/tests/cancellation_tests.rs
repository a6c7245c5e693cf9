use super::*;
use std::time::Duration;

#[tokio::test]
async fn not_cancelled_by_default() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn none_is_never_cancelled_until_explicitly_cancelled() {
    let token = CancellationToken::none();
    assert!(!token.is_cancelled());
    token.cancel();
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn cancelled_resolves_immediately_once_flag_is_set() {
    let token = CancellationToken::new();
    token.cancel();
    tokio::time::timeout(Duration::from_millis(50), token.cancelled())
        .await
        .expect("cancelled() resolves without waiting for a new cancel()");
}

#[tokio::test]
async fn cancelled_wakes_pending_waiters() {
    let token = CancellationToken::new();
    let waiter = token.clone();
    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();
    tokio::time::timeout(Duration::from_millis(100), handle)
        .await
        .expect("waiter task completes")
        .expect("waiter task does not panic");
}

#[tokio::test]
async fn with_timeout_cancels_after_the_bound() {
    let token = CancellationToken::with_timeout(Duration::from_millis(20));
    assert!(!token.is_cancelled());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn bounded_cancels_when_the_timeout_elapses_first() {
    let parent = CancellationToken::none();
    let bounded = parent.bounded(Duration::from_millis(20));
    assert!(!bounded.is_cancelled());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(bounded.is_cancelled());
    assert!(!parent.is_cancelled());
}

#[tokio::test]
async fn bounded_cancels_when_the_parent_cancels_first() {
    let parent = CancellationToken::none();
    let bounded = parent.bounded(Duration::from_secs(60));
    parent.cancel();
    tokio::time::timeout(Duration::from_millis(100), bounded.cancelled())
        .await
        .expect("bounded token observes the parent's cancellation");
    assert!(bounded.is_cancelled());
}
