//! Path registry configuration

use crate::pipe::FabricConfig;

/// Name of the worker that feeds the RTSP ingestion pipe
pub const DEFAULT_RTSP_WORKER: &str = "rtsp_254_0";

/// Path registry configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Addressing of the fabric the registry allocates on
    pub fabric: FabricConfig,

    /// Worker pushed into the RTSP pipe for RTSP-fed decoders
    pub rtsp_worker: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fabric: FabricConfig::default(),
            rtsp_worker: DEFAULT_RTSP_WORKER.to_owned(),
        }
    }
}

impl RegistryConfig {
    /// Set the fabric addressing
    pub fn fabric(mut self, fabric: FabricConfig) -> Self {
        self.fabric = fabric;
        self
    }

    /// Set the RTSP ingestion worker name
    pub fn rtsp_worker(mut self, name: impl Into<String>) -> Self {
        self.rtsp_worker = name.into();
        self
    }
}
