//! Grafana → Apprise webhook proxy.
//!
//! Receives Grafana alert webhooks, rewrites dashboard alerts into Apprise's
//! notification schema, and reverse-proxies everything to one upstream.
//!
//! ```text
//!   Grafana ──▶ http::server ──▶ translate ──▶ gateway ──▶ Apprise
//!          ◀──────────────── upstream response, verbatim ◀───
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod translate;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
