//! Error types
//!
//! A single error enum shared by the allocator, the path registry and the
//! configuration store.

use crate::pipe::PipeKind;

/// Error type for fabric operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Worker is missing the capability an allocation requires
    #[error("Bad input for node: worker {0} lacks the required capability")]
    BadInput(String),

    /// Request payload is missing or malformed
    #[error("Params parse error: {0}")]
    BadParams(String),

    /// Path id is invalid or has no saved params
    #[error("Path not exists: {0}")]
    PathNotFound(i64),

    /// Named worker is not in the worker registry
    #[error("Worker not exists: {0}")]
    WorkerNotFound(String),

    /// Worker is already bound to another path
    #[error("Worker in use: {worker} is bound to path {path}")]
    WorkerInUse { worker: String, path: u32 },

    /// Pipe slot already holds a different inbound worker
    #[error("Pipe {kind}/{path} already pushed by {current}")]
    PipeOccupied {
        kind: PipeKind,
        path: u32,
        current: String,
    },

    /// A worker control call failed
    #[error("Worker control failed: {0}")]
    Worker(String),

    /// Blocking store task panicked or was cancelled
    #[error("Blocking task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
