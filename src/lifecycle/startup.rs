//! Startup orchestration.
//!
//! The proxy runs from the directory holding its executable so that a
//! `conf.yml` shipped next to the binary is found.

use std::env;
use std::io;
use std::path::PathBuf;

use crate::config::ProxyConfig;

/// Change the working directory to the executable's directory.
///
/// Failing to locate the executable is fatal; failing to enter its directory
/// is logged and startup carries on from the current directory.
pub fn enter_executable_dir() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    let dir = exe
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))?;

    tracing::info!(path = %dir.display(), "Executing from");

    if let Err(e) = env::set_current_dir(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "Unable to change working directory");
    }

    Ok(dir)
}

/// Log the effective settings once the configuration is final.
pub fn log_setup(config: &ProxyConfig) {
    tracing::info!(port = config.port, "Listening on port");
    tracing::info!(url = %config.url, "Redirecting all requests to url");
    if let Some(addr) = &config.metrics_address {
        tracing::info!(address = %addr, "Metrics enabled");
    }
}
