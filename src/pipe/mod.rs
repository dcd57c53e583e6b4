//! Pipes: per-path push/pull slot sets
//!
//! A pipe multiplexes one kind of channel (encoder output, RTSP ingest) for a
//! single path id. It has at most one inbound (push) worker and any number of
//! outbound (pull) workers.
//!
//! # Architecture
//!
//! ```text
//!                         Fabric
//!              ┌────────────────────────────┐
//!              │ nodes: BTreeMap<PipeKind,  │
//!              │   Node {                   │
//!              │     ip, prefix,            │
//!              │     pipes: BTreeMap<Path,  │
//!              │       Pipe { in, out[] }>  │
//!              │   }                        │
//!              │ >                          │
//!              └─────────────┬──────────────┘
//!                            │
//!        ┌───────────────────┼───────────────────┐
//!        ▼                   ▼                   ▼
//!   alloc_push()        alloc_pull()        alloc_pull()
//!   [encoder]           [decoder]           [decoder]
//!   session: node ip    session: ports from the worker's own id
//!   + ports from path
//! ```
//!
//! Allocation is idempotent: re-allocating a worker already in its slot is a
//! no-op. Freeing is forgiving: freeing an absent pipe or worker is a no-op.

pub mod config;
pub mod entry;
pub mod info;
pub mod node;

use std::fmt;

pub use config::FabricConfig;
pub use entry::{Outbound, Pipe};
pub use info::PipeInfo;
pub use node::{Fabric, Node};

/// Kind of multiplexed channel a node serves
///
/// Declaration order is the order diagnostics are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipeKind {
    /// Pipe fed by the RTSP ingestion worker
    RtspIn,
    /// Pipe fed by an encoder worker
    Encoder,
}

impl PipeKind {
    /// All kinds in rendering order
    pub const ALL: [PipeKind; 2] = [PipeKind::RtspIn, PipeKind::Encoder];

    /// Stable name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PipeKind::RtspIn => "rtsp-in",
            PipeKind::Encoder => "encoder",
        }
    }
}

impl fmt::Display for PipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
