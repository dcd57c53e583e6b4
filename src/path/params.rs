//! Path settings record
//!
//! The payload of `set` and `get`, and the value persisted per path. Keys the
//! record does not know are kept in [`Params::extra`] and written back as-is.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Worker names look like `<kind>_<card>_<index>`
static WORKER_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+_\d+_\d+$").expect("worker name regex is a constant and always valid")
});

/// Settings of one path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Worker to bind
    #[serde(rename = "WorkerName")]
    pub worker_name: String,

    /// Requested run state of the worker
    #[serde(rename = "IsRunning")]
    pub is_running: bool,

    /// Feed a decoder from the RTSP ingestion pipe
    #[serde(
        rename = "RTSPIn",
        alias = "RtspIn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rtsp_in: Option<bool>,

    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Params {
    /// Create params for a worker
    pub fn new(worker_name: impl Into<String>, is_running: bool) -> Self {
        Self {
            worker_name: worker_name.into(),
            is_running,
            rtsp_in: None,
            extra: Map::new(),
        }
    }

    /// Set the RTSP input flag
    pub fn rtsp_in(mut self, enabled: bool) -> Self {
        self.rtsp_in = Some(enabled);
        self
    }

    /// Attach an opaque setting
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether RTSP input was requested
    pub fn wants_rtsp_in(&self) -> bool {
        self.rtsp_in.unwrap_or(false)
    }

    /// Decode a loosely typed request payload
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(Error::BadParams("missing params".into()));
        }
        serde_json::from_value(value).map_err(|e| Error::BadParams(e.to_string()))
    }

    /// Encode for a loosely typed response payload
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Literal checks only; whether the worker exists is decided later
    pub fn validate(&self) -> Result<()> {
        if !WORKER_NAME_REGEX.is_match(&self.worker_name) {
            return Err(Error::BadParams(format!(
                "worker name '{}' does not match <name>_<number>_<number>",
                self.worker_name
            )));
        }
        Ok(())
    }
}
