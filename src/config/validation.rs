//! Configuration validation.
//!
//! Serde handles the syntactic side; this covers what a well-formed document
//! can still get wrong. Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::gateway::upstream::{Upstream, UpstreamError};

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid upstream url: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a configuration before the proxy accepts it.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Upstream::parse(&config.url) {
        errors.push(ValidationError::Upstream(e));
    }

    if config.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if let Some(addr) = &config.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
