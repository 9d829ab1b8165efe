//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --config path (authoritative, no fallback)
//!   or conf.yml / /etc/grafana-apprise-proxy/conf.yml
//!     → loader.rs (first readable file, YAML deserialize)
//!     ↘ on failure: GRAFANA_APPRISE_PROXY_TARGET_{URL,PORT}
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with the request handler
//! ```
//!
//! Config is loaded once at startup. There is no reload.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::ProxyConfig;
pub use validation::ValidationError;
