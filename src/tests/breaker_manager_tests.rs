use super::*;
use crate::resilience::circuit_breaker::BreakerConfig;
use crate::worker::WorkerId;

#[test]
fn get_or_create_returns_the_same_breaker_for_the_same_id() {
    let manager = CircuitBreakerManager::new(BreakerConfig::default());
    let id = WorkerId::from("w1");
    let a = manager.get_or_create(&id);
    let b = manager.get_or_create(&id);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn get_or_create_gives_distinct_breakers_per_id() {
    let manager = CircuitBreakerManager::new(BreakerConfig::default());
    let a = manager.get_or_create(&WorkerId::from("a"));
    let b = manager.get_or_create(&WorkerId::from("b"));
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn stats_reports_every_breaker_created_so_far() {
    let manager = CircuitBreakerManager::new(BreakerConfig::default());
    manager.get_or_create(&WorkerId::from("a"));
    manager.get_or_create(&WorkerId::from("b"));
    let stats = manager.stats();
    assert_eq!(stats.len(), 2);
    assert!(stats.contains_key(&WorkerId::from("a")));
    assert!(stats.contains_key(&WorkerId::from("b")));
}
