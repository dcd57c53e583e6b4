//! Static worker lookup table

use std::collections::HashMap;
use std::sync::Arc;

use super::{Worker, WorkerRef, WorkerRole};

/// Name-indexed table of the workers a path registry may bind
#[derive(Debug, Clone, Default)]
pub struct WorkerRegistry {
    workers: HashMap<String, WorkerRef>,
}

impl WorkerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worker, replacing any worker registered under the same name
    pub fn register(&mut self, worker: WorkerRef) {
        if let Some(previous) = self.workers.insert(worker.name().to_owned(), worker) {
            tracing::warn!(worker = previous.name(), "Worker re-registered");
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_worker<W: Worker + 'static>(mut self, worker: Arc<W>) -> Self {
        self.register(worker);
        self
    }

    /// View restricted to workers carrying one of `roles`
    pub fn filtered(&self, roles: &[WorkerRole]) -> Self {
        let workers = self
            .workers
            .iter()
            .filter(|(_, w)| roles.iter().any(|r| w.has_role(*r)))
            .map(|(name, w)| (name.clone(), Arc::clone(w)))
            .collect();

        Self { workers }
    }

    /// Look up a worker by name
    pub fn find_by_name(&self, name: &str) -> Option<WorkerRef> {
        self.workers.get(name).cloned()
    }

    /// All workers, ordered by name
    pub fn list_all(&self) -> Vec<WorkerRef> {
        let mut all: Vec<WorkerRef> = self.workers.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// All worker names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered workers
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
