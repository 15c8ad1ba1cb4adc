//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::registry::RegistryConfig;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Shared secret required on `/webhook` (None = no auth)
    pub bearer: Option<String>,

    /// Largest accepted webhook body in bytes
    pub max_body_size: usize,

    /// Listener registry and relay settings
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            bearer: None,
            max_body_size: 2 * 1024 * 1024, // 2MB
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the listen port, keeping the host
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Require `Authorization: Bearer <token>` on `/webhook`
    ///
    /// An empty token disables the check.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// Set the maximum webhook body size
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}
