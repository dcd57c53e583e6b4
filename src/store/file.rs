//! Versioned JSON file store
//!
//! Layout:
//!
//! ```text
//! { "Version": "1.0.0", "Store": { "3": { "WorkerName": "dec_1_0", "IsRunning": true } } }
//! ```
//!
//! A file written by another version is discarded on load, there is no
//! migration.

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConfigStore, StoreMap};
use crate::error::Result;

/// Version token of the file layout
pub const STORE_VERSION: &str = "1.0.0";

/// Header read before the entries, so entries of another version are never decoded
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "Version")]
    version: String,

    #[serde(rename = "Store", default)]
    store: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(rename = "Version")]
    version: &'a str,

    #[serde(rename = "Store")]
    store: &'a StoreMap,
}

/// Store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling the next save is written to before it replaces the file
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<StoreMap> {
        let buf = match std::fs::read(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(file = %self.path.display(), "No store file, starting empty");
                return Ok(StoreMap::new());
            }
            Err(e) => {
                tracing::error!(file = %self.path.display(), error = %e, "Read store file failed");
                return Err(e.into());
            }
        };

        let doc: RawDocument = serde_json::from_slice(&buf).map_err(|e| {
            tracing::error!(file = %self.path.display(), error = %e, "Decode store file failed");
            e
        })?;

        if doc.version != STORE_VERSION {
            tracing::error!(
                file = %self.path.display(),
                version = %doc.version,
                expected = STORE_VERSION,
                "Store file version mismatch, discarding"
            );
            return Ok(StoreMap::new());
        }

        match doc.store {
            None | Some(Value::Null) => Ok(StoreMap::new()),
            Some(entries) => serde_json::from_value(entries).map_err(|e| {
                tracing::error!(file = %self.path.display(), error = %e, "Decode store entries failed");
                e.into()
            }),
        }
    }

    fn save(&self, store: &StoreMap) -> Result<()> {
        let doc = Document {
            version: STORE_VERSION,
            store,
        };
        let buf = serde_json::to_vec(&doc)?;

        // Write atomically via temp file
        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, &buf)
            .and_then(|()| std::fs::rename(&temp_path, &self.path));

        if let Err(e) = written {
            tracing::error!(file = %self.path.display(), error = %e, "Write store file failed");
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }
}

fn write_synced(path: &Path, buf: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(buf)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::path::Params;

    fn sample() -> StoreMap {
        let mut map = StoreMap::new();
        map.insert("3".into(), Params::new("dec_1_0", true));
        map.insert(
            "4".into(),
            Params::new("dec_3_0", false)
                .rtsp_in(true)
                .with_extra("Note", json!("lobby")),
        );
        map
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("paths.json"));

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_version_mismatch_discards() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        let old = json!({
            "Version": "0.9.0",
            "Store": { "3": { "WorkerName": "dec_1_0", "IsRunning": true } }
        });
        std::fs::write(&file, old.to_string()).unwrap();

        let store = JsonFileStore::new(&file);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_version_mismatch_with_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        // Entries of the old layout do not decode as current params
        let old = json!({
            "Version": "0.9.0",
            "Store": { "3": { "Worker": "dec_1_0" } }
        });
        std::fs::write(&file, old.to_string()).unwrap();

        assert!(JsonFileStore::new(&file).load().unwrap().is_empty());
    }

    #[test]
    fn test_current_version_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        std::fs::write(&file, r#"{"Version":"1.0.0","Store":{"3":{"Worker":"dec_1_0"}}}"#).unwrap();

        let result = JsonFileStore::new(&file).load();
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_save_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        std::fs::write(&file, b"previous contents").unwrap();
        let store = JsonFileStore::new(&file);

        store.save(&sample()).unwrap();

        assert_eq!(store.load().unwrap(), sample());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("paths.json")]);
    }

    #[test]
    fn test_failed_save_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("paths.json"));
        store.save(&sample()).unwrap();

        // A directory squatting on the temp name makes the write fail
        std::fs::create_dir(dir.path().join("paths.json.tmp")).unwrap();
        let mut map = StoreMap::new();
        map.insert("9".into(), Params::new("enc_2_0", true));

        assert!(matches!(store.save(&map), Err(Error::Io(_))));
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_null_store() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        std::fs::write(&file, r#"{"Version":"1.0.0","Store":null}"#).unwrap();

        assert!(JsonFileStore::new(&file).load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        std::fs::write(&file, b"{ not json").unwrap();

        let result = JsonFileStore::new(&file).load();
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("paths.json"));

        let mut map = StoreMap::new();
        map.insert("0".into(), Params::new("enc_2_0", true));
        store.save(&map).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "Version": "1.0.0",
                "Store": { "0": { "WorkerName": "enc_2_0", "IsRunning": true } }
            })
        );
    }
}
