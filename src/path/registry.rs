//! Path registry implementation
//!
//! Owns the bindings of every path, the fabric the bindings are allocated on,
//! and the saved settings. One `RwLock` guards all three: transitions take it
//! exclusively for their whole allocate/free sequence, queries take it shared.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::binding::{Binding, BindingState};
use super::config::RegistryConfig;
use super::params::Params;
use super::PathId;
use crate::error::{Error, Result};
use crate::pipe::info::write_trees;
use crate::pipe::{Fabric, PipeInfo};
use crate::store::{ConfigStore, StoreMap};
use crate::worker::{WorkerId, WorkerRef, WorkerRegistry};

/// State guarded by the registry lock
struct PathState {
    bindings: HashMap<PathId, Binding>,
    fabric: Fabric,
    params: BTreeMap<PathId, Params>,
}

impl PathState {
    /// Path other than `id` whose binding holds the worker, if any
    ///
    /// A binding holds its own worker and, when RTSP-fed, the ingest worker.
    fn holder_besides(&self, id: PathId, worker: WorkerId) -> Option<PathId> {
        self.bindings
            .iter()
            .find(|(path, b)| **path != id && b.holds(worker))
            .map(|(path, _)| *path)
    }

    /// Path other than `id` bound directly to the worker, if any
    fn bound_besides(&self, id: PathId, worker: WorkerId) -> Option<PathId> {
        self.bindings
            .iter()
            .find(|(path, b)| **path != id && b.worker_id() == worker)
            .map(|(path, _)| *path)
    }

    fn commit(&mut self, staged: Staged, params: Params) -> Option<Binding> {
        self.fabric = staged.fabric;
        self.params.insert(staged.id, params);
        self.bindings.insert(staged.id, staged.binding)
    }
}

/// A transition whose allocations are done but not yet visible
struct Staged {
    id: PathId,
    binding: Binding,
    fabric: Fabric,
    was_running: bool,
}

impl Staged {
    /// Put the worker back in the run state it had before staging
    fn revert_running(&self) {
        let worker = self.binding.worker();
        if let Err(e) = worker.set_running(self.was_running) {
            tracing::error!(
                worker = worker.name(),
                error = %e,
                "Restoring run state after failed save failed"
            );
        }
    }
}

/// Registry of all logical paths
///
/// Construct one per set of paths that should share a fabric and pass it to
/// whoever needs it; there is no global instance.
pub struct PathRegistry {
    state: RwLock<PathState>,
    workers: WorkerRegistry,
    store: Arc<dyn ConfigStore>,
    config: RegistryConfig,
}

impl PathRegistry {
    /// Create a registry with no bindings; the store is not read
    pub fn new(
        workers: WorkerRegistry,
        store: Arc<dyn ConfigStore>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            state: RwLock::new(PathState {
                bindings: HashMap::new(),
                fabric: Fabric::new(config.fabric.clone()),
                params: BTreeMap::new(),
            }),
            workers,
            store,
            config,
        }
    }

    /// Create a registry and re-apply the settings saved in `store`
    pub async fn open(
        workers: WorkerRegistry,
        store: Arc<dyn ConfigStore>,
        config: RegistryConfig,
    ) -> Result<Self> {
        let registry = Self::new(workers, store, config);
        registry.restore().await?;
        Ok(registry)
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Re-apply every saved entry
    ///
    /// Entries are applied in memory only. Entries with an invalid key, or
    /// that fail to apply, are dropped and the remaining map is saved once
    /// at the end; if nothing was dropped the store is left untouched.
    pub async fn restore(&self) -> Result<()> {
        let store = Arc::clone(&self.store);
        let saved = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| Error::Task(e.to_string()))??;

        let mut state = self.state.write().await;

        let mut dropped = 0usize;
        let mut ordered = BTreeMap::new();
        for (key, params) in saved {
            match PathId::from_key(&key) {
                Some(id) => {
                    ordered.insert(id, params);
                }
                None => {
                    tracing::error!(key = %key, "Saved params under invalid path id, dropping");
                    dropped += 1;
                }
            }
        }

        for (id, params) in ordered {
            match self.stage(&state, id, &params) {
                Ok(staged) => {
                    state.commit(staged, params);
                }
                Err(e) => {
                    tracing::error!(path = %id, error = %e, "Applying saved params failed, dropping");
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            self.persist(&state.params).await?;
        }

        tracing::info!(
            paths = state.bindings.len(),
            dropped = dropped,
            "Path registry restored"
        );

        Ok(())
    }

    /// Bind a path to the worker named in `params`
    ///
    /// Any previous binding of the path is torn down first. On error the
    /// path, the fabric and the store are left as they were.
    pub async fn set(&self, id: i64, params: Params) -> Result<()> {
        let id = PathId::parse(id)?;
        let mut state = self.state.write().await;
        self.apply(&mut state, id, params).await
    }

    /// [`set`](Self::set) with a loosely typed payload
    pub async fn set_value(&self, id: i64, params: Value) -> Result<()> {
        let id = PathId::parse(id)?;
        let params = Params::from_value(params)?;
        let mut state = self.state.write().await;
        self.apply(&mut state, id, params).await
    }

    /// Unbind a path and forget its settings
    ///
    /// Clearing an unbound path is a no-op.
    pub async fn clear(&self, id: i64) -> Result<()> {
        let id = PathId::parse(id)?;
        let mut state = self.state.write().await;

        if !state.bindings.contains_key(&id) && !state.params.contains_key(&id) {
            return Ok(());
        }

        let mut staged = state.fabric.clone();
        if let Some(previous) = state.bindings.get(&id) {
            previous.teardown(id, &mut staged)?;
        }

        let mut saved = state.params.clone();
        saved.remove(&id);
        self.persist(&saved).await?;

        state.fabric = staged;
        state.params = saved;
        if let Some(previous) = state.bindings.remove(&id) {
            tracing::info!(path = %id, worker = previous.worker().name(), "Path cleared");
        }

        Ok(())
    }

    /// Saved settings of a path
    pub async fn get(&self, id: i64) -> Result<Params> {
        let path = PathId::parse(id)?;
        let state = self.state.read().await;

        state
            .params
            .get(&path)
            .cloned()
            .ok_or(Error::PathNotFound(id))
    }

    /// Current binding of a path
    pub async fn binding(&self, id: i64) -> Result<BindingState> {
        let id = PathId::parse(id)?;
        let state = self.state.read().await;
        Ok(BindingState::from(state.bindings.get(&id)))
    }

    /// Sorted names of the workers this registry can bind
    pub async fn get_workers(&self) -> Vec<String> {
        let _state = self.state.read().await;
        self.workers.names()
    }

    /// Structured view of every allocated pipe
    pub async fn pipe_snapshot(&self) -> Vec<PipeInfo> {
        self.state.read().await.fabric.snapshot()
    }

    /// Write every allocated pipe as a tree
    pub async fn get_pipe_info<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let infos = self.pipe_snapshot().await;
        write_trees(w, &infos)
    }

    fn rtsp_worker(&self) -> Result<WorkerRef> {
        self.workers
            .find_by_name(&self.config.rtsp_worker)
            .ok_or_else(|| Error::WorkerNotFound(self.config.rtsp_worker.clone()))
    }

    /// Save the settings map on the blocking pool
    async fn persist(&self, params: &BTreeMap<PathId, Params>) -> Result<()> {
        let map: StoreMap = params
            .iter()
            .map(|(id, p)| (id.to_key(), p.clone()))
            .collect();

        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.save(&map))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    fn in_use(worker: &WorkerRef, path: PathId, other: PathId) -> Error {
        tracing::warn!(
            path = %path,
            worker = worker.name(),
            bound = %other,
            "Worker already bound to another path"
        );
        Error::WorkerInUse {
            worker: worker.name().to_owned(),
            path: other.get(),
        }
    }

    /// Run teardown and allocation on a copy of the fabric
    ///
    /// Leaves `state` untouched. The worker's run state is already applied
    /// on success; [`Staged::revert_running`] undoes it.
    fn stage(&self, state: &PathState, id: PathId, params: &Params) -> Result<Staged> {
        params.validate()?;

        let worker = self
            .workers
            .find_by_name(&params.worker_name)
            .ok_or_else(|| Error::WorkerNotFound(params.worker_name.clone()))?;

        if let Some(other) = state.holder_besides(id, worker.id()) {
            return Err(Self::in_use(&worker, id, other));
        }

        let binding = Binding::plan(&worker, params, || self.rtsp_worker())?;

        // The ingest worker may feed many paths, but never while bound directly
        if let Binding::DecoderViaRtsp { rtsp, .. } = &binding {
            if let Some(other) = state.bound_besides(id, rtsp.id()) {
                return Err(Self::in_use(rtsp, id, other));
            }
        }

        let mut fabric = state.fabric.clone();
        if let Some(previous) = state.bindings.get(&id) {
            previous.teardown(id, &mut fabric)?;
        }
        binding.establish(id, &mut fabric)?;

        let was_running = worker.is_running();
        worker.set_running(params.is_running)?;

        Ok(Staged {
            id,
            binding,
            fabric,
            was_running,
        })
    }

    /// Stage, persist, then commit one transition under the held write lock
    async fn apply(&self, state: &mut PathState, id: PathId, params: Params) -> Result<()> {
        let staged = self.stage(state, id, &params)?;

        let mut saved = state.params.clone();
        saved.insert(id, params.clone());
        if let Err(e) = self.persist(&saved).await {
            staged.revert_running();
            return Err(e);
        }

        let binding = staged.binding.state();
        let previous = state.commit(staged, params);

        tracing::info!(
            path = %id,
            previous = previous.as_ref().map(|b| b.worker().name()),
            binding = ?binding,
            "Path bound"
        );

        Ok(())
    }
}
