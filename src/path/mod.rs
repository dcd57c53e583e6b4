//! Logical paths and their worker bindings
//!
//! A path is a numbered media channel. Binding it to a worker allocates the
//! pipe slots that worker needs; re-binding tears the old slots down first.
//! All transitions go through [`PathRegistry`], which serializes them behind a
//! single lock.

pub mod binding;
pub mod config;
pub mod params;
pub mod registry;

use std::fmt;

use crate::error::{Error, Result};

pub use binding::{Binding, BindingState};
pub use config::RegistryConfig;
pub use params::Params;
pub use registry::PathRegistry;

/// Validated path id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    /// Wrap a non-negative id
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Validate a raw request id
    ///
    /// Negative ids and ids beyond `u32::MAX` do not name a path.
    pub fn parse(raw: i64) -> Result<Self> {
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| Error::PathNotFound(raw))
    }

    /// Parse a configuration store key
    pub fn from_key(key: &str) -> Option<Self> {
        key.parse::<u32>().ok().map(Self)
    }

    /// Key this path is stored under
    pub fn to_key(&self) -> String {
        self.0.to_string()
    }

    /// Raw id
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
