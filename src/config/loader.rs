//! Configuration loading from disk, with an environment fallback.
//!
//! The first readable file among the search paths is parsed. If no file can
//! be read, the file does not parse, or it has no `url`, the loader falls back
//! to `GRAFANA_APPRISE_PROXY_TARGET_URL` / `GRAFANA_APPRISE_PROXY_TARGET_PORT`.
//!
//! A path named with `--config` replaces the search entirely: it must load,
//! and nothing else is consulted.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{FileConfig, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "conf.yml";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/grafana-apprise-proxy/conf.yml";

/// Environment variable carrying the upstream URL.
pub const ENV_TARGET_URL: &str = "GRAFANA_APPRISE_PROXY_TARGET_URL";

/// Environment variable carrying the listen port override.
pub const ENV_TARGET_PORT: &str = "GRAFANA_APPRISE_PROXY_TARGET_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to find configuration file at {searched}")]
    NotFound { searched: String },

    #[error("unable to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing parameter 'url' from configuration file {path}")]
    MissingUrl { path: PathBuf },

    #[error("unable to locate environment variable {0}")]
    MissingEnv(&'static str),

    #[error("no upstream url could be resolved; file: {file}; environment: {env}")]
    Unresolved {
        file: Box<ConfigError>,
        env: Box<ConfigError>,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    let mut out = String::new();
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", err);
    }
    out
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves a `ProxyConfig` from the configured sources.
pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    paths: Vec<PathBuf>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader over `conf.yml` in the working directory, then the system path,
    /// then the process environment.
    pub fn new() -> Self {
        Self {
            explicit: None,
            paths: vec![PathBuf::from(CONFIG_FILE_NAME), PathBuf::from(SYSTEM_CONFIG_PATH)],
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Load only `path`. Failing to read or parse it is an error; the
    /// default locations and the environment are not consulted.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Replace the file search list.
    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    /// Replace the environment lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Load from the first usable source and validate the result.
    pub fn load(&self) -> Result<ProxyConfig, ConfigError> {
        if let Some(path) = &self.explicit {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
                path: path.clone(),
                source,
            })?;
            let config = parse_file(path, &content)?;
            validate_config(&config).map_err(ConfigError::Validation)?;
            return Ok(config);
        }

        let config = match self.load_from_file() {
            Ok(config) => config,
            Err(file_err) => {
                tracing::info!(
                    reason = %file_err,
                    "Unable to load configuration file, falling back to environment variables"
                );
                self.load_from_env().map_err(|env_err| ConfigError::Unresolved {
                    file: Box::new(file_err),
                    env: Box::new(env_err),
                })?
            }
        };

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn load_from_file(&self) -> Result<ProxyConfig, ConfigError> {
        for path in &self.paths {
            match fs::read_to_string(path) {
                Ok(content) => return parse_file(path, &content),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Configuration file not readable");
                }
            }
        }

        Err(ConfigError::NotFound {
            searched: self
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn load_from_env(&self) -> Result<ProxyConfig, ConfigError> {
        let url = (self.env)(ENV_TARGET_URL)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(ENV_TARGET_URL))?;

        let mut config = ProxyConfig::new(url);

        if let Some(raw) = (self.env)(ENV_TARGET_PORT).filter(|v| !v.is_empty()) {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(e) => {
                    tracing::error!(
                        variable = ENV_TARGET_PORT,
                        value = %raw,
                        error = %e,
                        "Invalid port override, keeping default"
                    );
                }
            }
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_file(path: &Path, content: &str) -> Result<ProxyConfig, ConfigError> {
    let file: FileConfig = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if file.url.is_empty() {
        return Err(ConfigError::MissingUrl {
            path: path.to_path_buf(),
        });
    }

    Ok(file.into())
}
