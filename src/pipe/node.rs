//! Node and fabric: pipe allocation bookkeeping

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use super::config::FabricConfig;
use super::entry::Pipe;
use super::info::PipeInfo;
use super::PipeKind;
use crate::error::{Error, Result};
use crate::path::PathId;
use crate::session::{derive_ports, Session};
use crate::worker::{WorkerId, WorkerRef};

/// All pipes of one kind, keyed by path id
///
/// Pipes are created on first allocation and are never removed, only drained.
#[derive(Debug, Clone)]
pub struct Node {
    kind: PipeKind,
    ip: IpAddr,
    prefix: u32,
    in_base_port: u32,
    out_base_port: u32,
    pipes: BTreeMap<PathId, Pipe>,
}

impl Node {
    /// Create an empty node
    pub fn new(kind: PipeKind, config: &FabricConfig) -> Self {
        Self {
            kind,
            ip: config.ip,
            prefix: config.prefix,
            in_base_port: config.in_base_port,
            out_base_port: config.out_base_port,
            pipes: BTreeMap::new(),
        }
    }

    /// Kind of pipes this node serves
    pub fn kind(&self) -> PipeKind {
        self.kind
    }

    /// Control-plane address handed to push workers
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Get the pipe for a path, if it was ever allocated
    pub fn pipe(&self, id: PathId) -> Option<&Pipe> {
        self.pipes.get(&id)
    }

    /// Iterate pipes in path order
    pub fn pipes(&self) -> impl Iterator<Item = (PathId, &Pipe)> {
        self.pipes.iter().map(|(id, pipe)| (*id, pipe))
    }

    /// Current push worker of a path
    pub fn inbound(&self, id: PathId) -> Option<&WorkerRef> {
        self.pipe(id).and_then(|p| p.inbound())
    }

    /// Ids of the current pull workers of a path
    pub fn outbound_ids(&self, id: PathId) -> Vec<WorkerId> {
        self.pipe(id)
            .map(|p| p.outbound().iter().map(|o| o.worker.id()).collect())
            .unwrap_or_default()
    }

    fn pipe_mut(&mut self, id: PathId) -> &mut Pipe {
        let (base, prefix) = (self.in_base_port, self.prefix);
        self.pipes
            .entry(id)
            .or_insert_with(|| Pipe::new(derive_ports(base, prefix, id.get())))
    }

    /// Attach a decoder as a pull worker of a path
    ///
    /// The decoder's session ports are derived from its own worker id. A
    /// decoder already attached is left untouched.
    pub fn alloc_pull(&mut self, id: PathId, worker: &WorkerRef) -> Result<()> {
        if !worker.is_decoder() {
            return Err(Error::BadInput(worker.name().to_owned()));
        }

        let (base, prefix, kind) = (self.out_base_port, self.prefix, self.kind);
        let pipe = self.pipe_mut(id);

        if pipe.has_outbound(worker.id()) {
            return Ok(());
        }

        let session = Session::new(derive_ports(base, prefix, worker.id().0));
        worker.assign_decode_session(session)?;

        pipe.push_outbound(Arc::clone(worker), session);

        tracing::debug!(
            pipe = %kind,
            path = %id,
            worker = worker.name(),
            session = %session,
            "Pull allocated"
        );

        Ok(())
    }

    /// Detach a decoder from the pull workers of a path
    ///
    /// No-op if the pipe was never allocated or the decoder is not attached.
    /// The order of the remaining pull workers is not preserved.
    pub fn free_pull(&mut self, id: PathId, worker: &WorkerRef) -> Result<()> {
        let kind = self.kind;
        let Some(pipe) = self.pipes.get_mut(&id) else {
            return Ok(());
        };

        if !worker.is_decoder() {
            return Err(Error::BadInput(worker.name().to_owned()));
        }

        if pipe.remove_outbound(worker.id()).is_some() {
            tracing::debug!(pipe = %kind, path = %id, worker = worker.name(), "Pull freed");
        }

        Ok(())
    }

    /// Attach an encoder as the push worker of a path
    ///
    /// The encoder is given this node's address and the path-derived ports.
    /// Re-allocating the current push worker is a no-op; a different worker
    /// fails with [`Error::PipeOccupied`] until [`free_push`](Self::free_push)
    /// is called.
    pub fn alloc_push(&mut self, id: PathId, worker: &WorkerRef) -> Result<()> {
        if !worker.is_encoder() {
            return Err(Error::BadInput(worker.name().to_owned()));
        }

        let (ip, kind) = (self.ip, self.kind);
        let pipe = self.pipe_mut(id);

        if let Some(current) = pipe.inbound() {
            if current.id() == worker.id() {
                return Ok(());
            }
            return Err(Error::PipeOccupied {
                kind,
                path: id.get(),
                current: current.name().to_owned(),
            });
        }

        let session = Session::with_ip(ip, pipe.in_ports);
        worker.assign_encode_session(session)?;

        pipe.set_inbound(Arc::clone(worker));

        tracing::debug!(
            pipe = %kind,
            path = %id,
            worker = worker.name(),
            session = %session,
            "Push allocated"
        );

        Ok(())
    }

    /// Clear the push worker of a path
    ///
    /// Does not check which worker held the slot.
    pub fn free_push(&mut self, id: PathId) -> Result<()> {
        if let Some(pipe) = self.pipes.get_mut(&id) {
            if let Some(previous) = pipe.take_inbound() {
                tracing::debug!(
                    pipe = %self.kind,
                    path = %id,
                    worker = previous.name(),
                    "Push freed"
                );
            }
        }

        Ok(())
    }

    /// Diagnostic snapshot of every pipe, in path order
    pub fn snapshot(&self) -> Vec<PipeInfo> {
        self.pipes
            .iter()
            .map(|(id, pipe)| PipeInfo::from_pipe(self.kind, *id, pipe))
            .collect()
    }
}

/// Nodes of a deployment, keyed by pipe kind
#[derive(Debug, Clone)]
pub struct Fabric {
    config: FabricConfig,
    nodes: BTreeMap<PipeKind, Node>,
}

impl Fabric {
    /// Create a fabric with one empty node per known pipe kind
    pub fn new(config: FabricConfig) -> Self {
        let nodes = PipeKind::ALL
            .iter()
            .map(|kind| (*kind, Node::new(*kind, &config)))
            .collect();

        Self { config, nodes }
    }

    /// Shared addressing config
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Get the node for a pipe kind
    pub fn node(&self, kind: PipeKind) -> Option<&Node> {
        self.nodes.get(&kind)
    }

    /// Get the node for a pipe kind, creating it if needed
    pub fn node_mut(&mut self, kind: PipeKind) -> &mut Node {
        let config = &self.config;
        self.nodes
            .entry(kind)
            .or_insert_with(|| Node::new(kind, config))
    }

    /// Diagnostic snapshot of all nodes, in kind then path order
    pub fn snapshot(&self) -> Vec<PipeInfo> {
        self.nodes.values().flat_map(|n| n.snapshot()).collect()
    }
}

impl Default for Fabric {
    fn default() -> Self {
        Self::new(FabricConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::worker::SimWorker;

    fn node() -> Node {
        Node::new(PipeKind::Encoder, &FabricConfig::default().prefix(100))
    }

    fn path(id: u32) -> PathId {
        PathId::new(id)
    }

    #[test]
    fn test_alloc_pull() {
        let mut node = node();
        let sim = Arc::new(SimWorker::decoder(2, "dec_2_0"));
        let dec: WorkerRef = sim.clone();

        node.alloc_pull(path(3), &dec).unwrap();

        let pipe = node.pipe(path(3)).unwrap();
        assert_eq!(pipe.in_ports, [8112, 8114]);
        assert_eq!(node.outbound_ids(path(3)), vec![WorkerId(2)]);

        // Session comes from the worker id, not the path id
        assert_eq!(sim.decode_session(), Some(Session::new([8108, 8110])));
        assert_eq!(pipe.out_ports(), vec![[8108, 8110]]);
        assert_eq!(pipe.out_ips(), vec![None]);
    }

    #[test]
    fn test_alloc_pull_idempotent() {
        let mut node = node();
        let sim = Arc::new(SimWorker::decoder(1, "dec_1_0"));
        let dec: WorkerRef = sim.clone();

        node.alloc_pull(path(0), &dec).unwrap();
        node.alloc_pull(path(0), &dec).unwrap();

        assert_eq!(node.outbound_ids(path(0)), vec![WorkerId(1)]);
        assert_eq!(sim.decode_assignments(), 1);
    }

    #[test]
    fn test_alloc_pull_rejects_encoder() {
        let mut node = node();
        let enc: WorkerRef = Arc::new(SimWorker::encoder(1, "enc_1_0"));

        let result = node.alloc_pull(path(0), &enc);
        assert!(matches!(result, Err(Error::BadInput(_))));
        assert!(node.pipe(path(0)).is_none());
    }

    #[test]
    fn test_alloc_pull_assign_failure_leaves_no_state() {
        let mut node = node();
        let sim = Arc::new(SimWorker::decoder(1, "dec_1_0"));
        sim.fail_assignments(true);
        let dec: WorkerRef = sim.clone();

        assert!(node.alloc_pull(path(0), &dec).is_err());
        assert!(node.outbound_ids(path(0)).is_empty());
    }

    #[test]
    fn test_free_pull() {
        let mut node = node();
        let a: WorkerRef = Arc::new(SimWorker::decoder(1, "dec_1_0"));
        let b: WorkerRef = Arc::new(SimWorker::decoder(2, "dec_2_0"));

        node.alloc_pull(path(5), &a).unwrap();
        node.alloc_pull(path(5), &b).unwrap();

        node.free_pull(path(5), &a).unwrap();
        assert_eq!(node.outbound_ids(path(5)), vec![WorkerId(2)]);

        // Second free is a no-op
        node.free_pull(path(5), &a).unwrap();
        assert_eq!(node.outbound_ids(path(5)), vec![WorkerId(2)]);

        // Pipe survives being drained
        node.free_pull(path(5), &b).unwrap();
        assert!(node.pipe(path(5)).unwrap().is_empty());
    }

    #[test]
    fn test_free_pull_unknown_pipe() {
        let mut node = node();
        let dec: WorkerRef = Arc::new(SimWorker::decoder(1, "dec_1_0"));

        node.free_pull(path(42), &dec).unwrap();
        assert!(node.pipe(path(42)).is_none());
    }

    #[test]
    fn test_alloc_push() {
        let config = FabricConfig::default().ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let mut node = Node::new(PipeKind::Encoder, &config);
        let sim = Arc::new(SimWorker::encoder(7, "enc_7_0"));
        let enc: WorkerRef = sim.clone();

        node.alloc_push(path(2), &enc).unwrap();
        node.alloc_push(path(2), &enc).unwrap();

        assert_eq!(node.inbound(path(2)).unwrap().id(), WorkerId(7));
        assert_eq!(sim.encode_assignments(), 1);
        assert_eq!(
            sim.encode_session(),
            Some(Session::with_ip(config.ip, [8008, 8010]))
        );
    }

    #[test]
    fn test_alloc_push_conflict() {
        let mut node = node();
        let first: WorkerRef = Arc::new(SimWorker::encoder(1, "enc_1_0"));
        let second: WorkerRef = Arc::new(SimWorker::encoder(2, "enc_2_0"));

        node.alloc_push(path(1), &first).unwrap();

        let result = node.alloc_push(path(1), &second);
        assert!(matches!(
            result,
            Err(Error::PipeOccupied { ref current, .. }) if current == "enc_1_0"
        ));
        assert_eq!(node.inbound(path(1)).unwrap().id(), WorkerId(1));

        node.free_push(path(1)).unwrap();
        node.alloc_push(path(1), &second).unwrap();
        assert_eq!(node.inbound(path(1)).unwrap().id(), WorkerId(2));
    }

    #[test]
    fn test_alloc_push_rejects_decoder() {
        let mut node = node();
        let dec: WorkerRef = Arc::new(SimWorker::decoder(1, "dec_1_0"));

        assert!(matches!(
            node.alloc_push(path(0), &dec),
            Err(Error::BadInput(_))
        ));
    }

    #[test]
    fn test_free_push_unknown_pipe() {
        let mut node = node();
        node.free_push(path(9)).unwrap();
        assert!(node.pipe(path(9)).is_none());
    }

    #[test]
    fn test_fabric_nodes() {
        let mut fabric = Fabric::new(FabricConfig::default().prefix(8));
        let enc: WorkerRef = Arc::new(SimWorker::encoder(1, "enc_1_0"));

        fabric
            .node_mut(PipeKind::RtspIn)
            .alloc_push(path(0), &enc)
            .unwrap();

        assert_eq!(fabric.config().prefix, 8);
        assert!(fabric.node(PipeKind::Encoder).unwrap().pipe(path(0)).is_none());
        let snapshot = fabric.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kind, PipeKind::RtspIn);
        assert_eq!(snapshot[0].inbound.as_deref(), Some("enc_1_0"));
    }
}
