//! Control plane for a media routing fabric
//!
//! Binds numbered media paths to encoder and decoder workers, and allocates
//! the session endpoints (IP + port pairs) those workers stream over.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fabric_ctl::{JsonFileStore, Params, PathRegistry, RegistryConfig, SimWorker, WorkerRegistry};
//!
//! # async fn run() -> fabric_ctl::Result<()> {
//! let workers = WorkerRegistry::new()
//!     .with_worker(Arc::new(SimWorker::decoder(1, "dec_1_0")))
//!     .with_worker(Arc::new(SimWorker::encoder(2, "enc_2_0")));
//! let store = Arc::new(JsonFileStore::new("paths.json"));
//!
//! let registry = PathRegistry::open(workers, store, RegistryConfig::default()).await?;
//! registry.set(3, Params::new("dec_1_0", true)).await?;
//! registry.get_pipe_info(&mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod path;
pub mod pipe;
pub mod session;
pub mod store;
pub mod worker;

pub use error::{Error, Result};
pub use path::{BindingState, Params, PathId, PathRegistry, RegistryConfig};
pub use pipe::{Fabric, FabricConfig, Node, PipeInfo, PipeKind};
pub use session::{derive_ports, Session};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, StoreMap};
pub use worker::{SimWorker, Worker, WorkerId, WorkerRef, WorkerRegistry, WorkerRole};
