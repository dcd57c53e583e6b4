//! Fabric configuration

use std::net::{IpAddr, Ipv4Addr};

use crate::session::{IN_BASE_PORT, OUT_BASE_PORT};

/// Addressing shared by every node of a fabric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricConfig {
    /// Address of this control-plane instance, handed to push workers
    pub ip: IpAddr,

    /// Service namespace offset, separates deployments sharing base ports
    pub prefix: u32,

    /// Base for ports derived from path ids
    pub in_base_port: u32,

    /// Base for ports derived from worker ids
    pub out_base_port: u32,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            prefix: 0,
            in_base_port: IN_BASE_PORT,
            out_base_port: OUT_BASE_PORT,
        }
    }
}

impl FabricConfig {
    /// Create a config for the given address
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            ip,
            ..Default::default()
        }
    }

    /// Set the control-plane address
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Set the deployment prefix
    pub fn prefix(mut self, prefix: u32) -> Self {
        self.prefix = prefix;
        self
    }

    /// Set the inbound base port
    pub fn in_base_port(mut self, port: u32) -> Self {
        self.in_base_port = port;
        self
    }

    /// Set the outbound base port
    pub fn out_base_port(mut self, port: u32) -> Self {
        self.out_base_port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FabricConfig::default();

        assert_eq!(config.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.prefix, 0);
        assert_eq!(config.in_base_port, 8000);
        assert_eq!(config.out_base_port, 8000);
    }

    #[test]
    fn test_builder_chaining() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let config = FabricConfig::default()
            .ip(ip)
            .prefix(100)
            .in_base_port(9000)
            .out_base_port(12000);

        assert_eq!(config.ip, ip);
        assert_eq!(config.prefix, 100);
        assert_eq!(config.in_base_port, 9000);
        assert_eq!(config.out_base_port, 12000);
        assert_eq!(FabricConfig::with_ip(ip).ip, ip);
    }
}
