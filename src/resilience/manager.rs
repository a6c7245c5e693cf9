//! Maintains one [`CircuitBreaker`] per worker id, created lazily.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::resilience::circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitBreakerStats};
use crate::worker::WorkerId;

#[derive(Default)]
pub struct CircuitBreakerManager {
    config: BreakerConfig,
    breakers: RwLock<HashMap<WorkerId, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerManager {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the breaker for `id`, creating one with this manager's
    /// configured defaults on first access.
    pub fn get_or_create(&self, id: &WorkerId) -> Arc<CircuitBreaker> {
        if let Some(existing) = self
            .breakers
            .read()
            .expect("breaker manager lock poisoned")
            .get(id)
        {
            return existing.clone();
        }
        let mut breakers = self.breakers.write().expect("breaker manager lock poisoned");
        breakers
            .entry(id.clone())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config)))
            .clone()
    }

    /// Snapshot of every breaker currently tracked, for `GetCircuitBreakerStats`.
    pub fn stats(&self) -> HashMap<WorkerId, CircuitBreakerStats> {
        let breakers = self.breakers.read().expect("breaker manager lock poisoned");
        breakers
            .iter()
            .map(|(id, breaker)| (id.clone(), breaker.stats()))
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/breaker_manager_tests.rs"]
mod tests;
