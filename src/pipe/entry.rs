//! Per-path pipe state

use std::net::IpAddr;

use crate::session::Session;
use crate::worker::{WorkerId, WorkerRef};

/// An outbound (pull) worker and the session it was given
#[derive(Debug, Clone)]
pub struct Outbound {
    pub worker: WorkerRef,
    pub session: Session,
}

/// Slot set for one path id on one node
#[derive(Debug, Clone)]
pub struct Pipe {
    /// Ports derived from the path id, handed to the push worker
    pub in_ports: [u32; 2],

    /// Current push worker
    inbound: Option<WorkerRef>,

    /// Current pull workers, each at most once, in no particular order
    outbound: Vec<Outbound>,
}

impl Pipe {
    pub(super) fn new(in_ports: [u32; 2]) -> Self {
        Self {
            in_ports,
            inbound: None,
            outbound: Vec::new(),
        }
    }

    /// Current push worker
    pub fn inbound(&self) -> Option<&WorkerRef> {
        self.inbound.as_ref()
    }

    /// Current pull workers
    pub fn outbound(&self) -> &[Outbound] {
        &self.outbound
    }

    /// Whether `id` is one of the pull workers
    pub fn has_outbound(&self, id: WorkerId) -> bool {
        self.outbound.iter().any(|o| o.worker.id() == id)
    }

    /// Addresses of the pull sessions, one per pull worker
    pub fn out_ips(&self) -> Vec<Option<IpAddr>> {
        self.outbound.iter().map(|o| o.session.ip).collect()
    }

    /// Port pairs of the pull sessions, one per pull worker
    pub fn out_ports(&self) -> Vec<[u32; 2]> {
        self.outbound.iter().map(|o| o.session.ports).collect()
    }

    /// Whether no worker occupies the pipe
    pub fn is_empty(&self) -> bool {
        self.inbound.is_none() && self.outbound.is_empty()
    }

    pub(super) fn set_inbound(&mut self, worker: WorkerRef) {
        self.inbound = Some(worker);
    }

    pub(super) fn take_inbound(&mut self) -> Option<WorkerRef> {
        self.inbound.take()
    }

    pub(super) fn push_outbound(&mut self, worker: WorkerRef, session: Session) {
        self.outbound.push(Outbound { worker, session });
    }

    /// Remove a pull worker by swapping the last one into its place
    ///
    /// O(1); the order of the remaining pull workers changes.
    pub(super) fn remove_outbound(&mut self, id: WorkerId) -> Option<Outbound> {
        let idx = self.outbound.iter().position(|o| o.worker.id() == id)?;
        Some(self.outbound.swap_remove(idx))
    }
}
