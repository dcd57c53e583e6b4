//! Network sessions assigned to workers
//!
//! A session is the endpoint a worker sends to or receives from: an optional
//! IP address and a pair of ports. Ports are derived deterministically from a
//! base port, a deployment prefix and a numeric id, so no central port table
//! is needed.
//!
//! ```text
//!  base + prefix + 4*id
//!  │
//!  ▼
//!  ┌──────┬──────┬──────┬──────┐
//!  │  a   │      │ a+2  │      │   one 4-port window per id
//!  └──────┴──────┴──────┴──────┘
//! ```

use std::fmt;
use std::net::IpAddr;

/// Default base for ports derived from a path id (inbound side of a pipe)
pub const IN_BASE_PORT: u32 = 8000;

/// Default base for ports derived from a worker id (outbound side of a pipe)
pub const OUT_BASE_PORT: u32 = 8000;

/// Width of the port window reserved per id
pub const PORT_STRIDE: u32 = 4;

/// Derive the port pair for `id`
///
/// Returns `[a, a + 2]` with `a = base + prefix + 4 * id`. Arithmetic wraps,
/// so the function is total.
pub fn derive_ports(base: u32, prefix: u32, id: u32) -> [u32; 2] {
    let first = base
        .wrapping_add(prefix)
        .wrapping_add(PORT_STRIDE.wrapping_mul(id));
    [first, first.wrapping_add(2)]
}

/// Endpoint assigned to a worker for one role on one pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session {
    /// Address to talk to, if the role needs one
    pub ip: Option<IpAddr>,
    /// Port pair
    pub ports: [u32; 2],
}

impl Session {
    /// Session with ports only
    pub fn new(ports: [u32; 2]) -> Self {
        Self { ip: None, ports }
    }

    /// Session bound to an address
    pub fn with_ip(ip: IpAddr, ports: [u32; 2]) -> Self {
        Self { ip: Some(ip), ports }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            Some(ip) => write!(f, "{}:{}/{}", ip, self.ports[0], self.ports[1]),
            None => write!(f, "*:{}/{}", self.ports[0], self.ports[1]),
        }
    }
}
