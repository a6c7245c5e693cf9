//! Thread-safe catalog of registered workers, indexed by id, role, and
//! capability (spec §4.3).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::CoreError;
use crate::worker::{Capability, Role, Worker, WorkerId};

/// Keyed store of registered workers. All operations are safe under
/// concurrent calls; `list*` returns a snapshot that need not reflect
/// concurrent mutations made after the call returns.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<HashMap<WorkerId, Arc<dyn Worker>>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `worker` by id, silently replacing any prior entry under
    /// the same id (spec §9: re-registration under the same id is left
    /// open; this crate replaces, matching the source crate's actor
    /// re-spawn-on-same-id convention).
    pub fn register(&self, worker: Arc<dyn Worker>) -> Result<(), CoreError> {
        let id = worker.id().clone();
        let mut workers = self.workers.write().expect("registry lock poisoned");
        if workers.insert(id.clone(), worker).is_some() {
            tracing::debug!("worker {} re-registered, replacing prior entry", id);
        }
        Ok(())
    }

    /// Idempotent: unregistering an unknown id is a no-op.
    pub fn unregister(&self, id: &WorkerId) {
        let mut workers = self.workers.write().expect("registry lock poisoned");
        workers.remove(id);
    }

    pub fn get(&self, id: &WorkerId) -> Result<Arc<dyn Worker>, CoreError> {
        let workers = self.workers.read().expect("registry lock poisoned");
        workers
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::WorkerNotFound(id.clone()))
    }

    pub fn list_by_role(&self, role: Role) -> Vec<Arc<dyn Worker>> {
        let workers = self.workers.read().expect("registry lock poisoned");
        workers
            .values()
            .filter(|w| w.role() == role)
            .cloned()
            .collect()
    }

    pub fn list_by_capability(&self, capability: Capability) -> Vec<Arc<dyn Worker>> {
        let workers = self.workers.read().expect("registry lock poisoned");
        workers
            .values()
            .filter(|w| w.capabilities().contains(&capability))
            .cloned()
            .collect()
    }

    pub fn list(&self) -> Vec<Arc<dyn Worker>> {
        let workers = self.workers.read().expect("registry lock poisoned");
        workers.values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        let workers = self.workers.read().expect("registry lock poisoned");
        workers.len()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
