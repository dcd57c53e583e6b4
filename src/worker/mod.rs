//! Workers: the encoder and decoder units paths are bound to
//!
//! Workers are owned by whoever composes the fabric. The allocator and the
//! path registry only hold shared [`WorkerRef`] handles and compare workers by
//! [`WorkerId`], never by pointer.

pub mod registry;
pub mod sim;

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::error::Result;
use crate::session::Session;

pub use registry::WorkerRegistry;
pub use sim::SimWorker;

/// Numeric worker identity, also the seed for outbound session ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability category used to select which workers a registry exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// Pulls media out of a pipe
    Decoder,
    /// Pushes media into a pipe
    Encoder,
}

/// A processing unit that can be bound to a path
///
/// Control calls take `&self`; implementations keep their own interior state.
/// The path registry only invokes them while holding its exclusive lock.
pub trait Worker: Send + Sync + fmt::Debug {
    /// Numeric identity
    fn id(&self) -> WorkerId;

    /// Registered name, e.g. `dec_1_0`
    fn name(&self) -> &str;

    /// Address of the unit, if known
    fn ip(&self) -> Option<IpAddr> {
        None
    }

    /// Whether the worker can pull from a pipe
    fn is_decoder(&self) -> bool {
        false
    }

    /// Whether the worker can push into a pipe
    fn is_encoder(&self) -> bool {
        false
    }

    /// Current running state
    fn is_running(&self) -> bool;

    /// Start or stop the worker
    fn set_running(&self, running: bool) -> Result<()>;

    /// Hand the worker the session it should decode from
    fn assign_decode_session(&self, session: Session) -> Result<()>;

    /// Hand the worker the session it should encode to
    fn assign_encode_session(&self, session: Session) -> Result<()>;

    /// Whether the worker has the capability for `role`
    fn has_role(&self, role: WorkerRole) -> bool {
        match role {
            WorkerRole::Decoder => self.is_decoder(),
            WorkerRole::Encoder => self.is_encoder(),
        }
    }
}

/// Shared, non-owning handle to a worker
pub type WorkerRef = Arc<dyn Worker>;
