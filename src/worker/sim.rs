//! In-memory worker
//!
//! Records the sessions and running state it is given instead of driving
//! hardware. Used by the demo, by tests, and as a stand-in for units that are
//! configured out-of-band.

use std::net::IpAddr;

use parking_lot::Mutex;

use super::{Worker, WorkerId};
use crate::error::{Error, Result};
use crate::session::Session;

#[derive(Debug, Default)]
struct SimState {
    running: bool,
    decode_session: Option<Session>,
    encode_session: Option<Session>,
    decode_assignments: u32,
    encode_assignments: u32,
    fail_assign: bool,
    fail_running: bool,
}

/// Worker that keeps its control state in memory
#[derive(Debug)]
pub struct SimWorker {
    id: WorkerId,
    name: String,
    ip: Option<IpAddr>,
    decoder: bool,
    encoder: bool,
    state: Mutex<SimState>,
}

impl SimWorker {
    fn new(id: u32, name: impl Into<String>, decoder: bool, encoder: bool) -> Self {
        Self {
            id: WorkerId(id),
            name: name.into(),
            ip: None,
            decoder,
            encoder,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Create a decoder
    pub fn decoder(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, true, false)
    }

    /// Create an encoder
    pub fn encoder(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, false, true)
    }

    /// Set the unit address
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Make subsequent session assignments fail
    pub fn fail_assignments(&self, fail: bool) {
        self.state.lock().fail_assign = fail;
    }

    /// Make subsequent run/stop calls fail
    pub fn fail_running(&self, fail: bool) {
        self.state.lock().fail_running = fail;
    }

    /// Last decode session handed to this worker
    pub fn decode_session(&self) -> Option<Session> {
        self.state.lock().decode_session
    }

    /// Last encode session handed to this worker
    pub fn encode_session(&self) -> Option<Session> {
        self.state.lock().encode_session
    }

    /// Number of decode sessions assigned so far
    pub fn decode_assignments(&self) -> u32 {
        self.state.lock().decode_assignments
    }

    /// Number of encode sessions assigned so far
    pub fn encode_assignments(&self) -> u32 {
        self.state.lock().encode_assignments
    }
}

impl Worker for SimWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    fn is_decoder(&self) -> bool {
        self.decoder
    }

    fn is_encoder(&self) -> bool {
        self.encoder
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn set_running(&self, running: bool) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_running {
            return Err(Error::Worker(format!("{}: run state rejected", self.name)));
        }
        state.running = running;
        Ok(())
    }

    fn assign_decode_session(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_assign {
            return Err(Error::Worker(format!("{}: decode session rejected", self.name)));
        }
        state.decode_session = Some(session);
        state.decode_assignments += 1;
        Ok(())
    }

    fn assign_encode_session(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_assign {
            return Err(Error::Worker(format!("{}: encode session rejected", self.name)));
        }
        state.encode_session = Some(session);
        state.encode_assignments += 1;
        Ok(())
    }
}
