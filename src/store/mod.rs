//! Persistent path settings
//!
//! The registry writes the full settings map after every committed
//! transition and reads it back once at startup.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::path::Params;

pub use file::{JsonFileStore, STORE_VERSION};
pub use memory::MemoryStore;

/// Settings keyed by path id string
pub type StoreMap = BTreeMap<String, Params>;

/// Backing storage for path settings
pub trait ConfigStore: Send + Sync {
    /// Read every saved entry
    fn load(&self) -> Result<StoreMap>;

    /// Replace the saved entries
    fn save(&self, store: &StoreMap) -> Result<()>;
}
