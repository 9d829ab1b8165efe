//! Configuration schema definitions.
//!
//! `FileConfig` mirrors the YAML document on disk. `ProxyConfig` is what the
//! rest of the proxy reads once loading and validation have succeeded.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Listen port used when neither the file nor the environment sets one.
pub const DEFAULT_PORT: u16 = 1445;

/// Largest request body buffered for inspection (2MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Root configuration for the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Upstream base URL every request is forwarded to.
    pub url: String,

    /// Port the proxy listens on (all interfaces).
    pub port: u16,

    /// Maximum request body size accepted, in bytes.
    pub max_body_bytes: usize,

    /// Optional bind address for the Prometheus scrape endpoint.
    pub metrics_address: Option<String>,
}

impl ProxyConfig {
    /// Configuration targeting `url` with every other setting at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            metrics_address: None,
        }
    }

    /// Address the listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// On-disk layout of `conf.yml`.
///
/// ```yaml
/// url: http://apprise:8000/notify/apprise
/// port: 1445
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub url: String,
    pub port: Option<u16>,
    pub max_body_bytes: Option<usize>,
    pub metrics_address: Option<String>,
}

impl From<FileConfig> for ProxyConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            url: file.url,
            port: file.port.unwrap_or(DEFAULT_PORT),
            max_body_bytes: file.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            metrics_address: file.metrics_address,
        }
    }
}
