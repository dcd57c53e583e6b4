//! In-process store

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use super::{ConfigStore, StoreMap};
use crate::error::{Error, Result};

/// Store that keeps the settings map in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<StoreMap>,
    fail_saves: AtomicBool,
    saves: AtomicU32,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `map`
    pub fn with_entries(map: StoreMap) -> Self {
        Self {
            map: Mutex::new(map),
            ..Default::default()
        }
    }

    /// Make subsequent saves fail with an I/O error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Copy of the saved entries
    pub fn snapshot(&self) -> StoreMap {
        self.map.lock().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::Relaxed)
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<StoreMap> {
        Ok(self.map.lock().clone())
    }

    fn save(&self, store: &StoreMap) -> Result<()> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(Error::Io(std::io::Error::other("store unavailable")));
        }
        *self.map.lock() = store.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
