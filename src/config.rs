//! Runtime configuration for the binaries.
//!
//! Resolution order: built-in defaults, then the TOML file named by
//! `ENSAIO_TOOL_CONFIG` (or `ensaio-tool.toml` in the working directory when
//! present), then individual environment variables.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "ENSAIO_TOOL_CONFIG";
pub const HTTP_ADDR_ENV: &str = "ENSAIO_TOOL_HTTP_ADDR";
pub const DATABASE_ENV: &str = "ENSAIO_TOOL_DATABASE";
pub const SEED_ENV: &str = "ENSAIO_TOOL_SEED";
pub const LOG_ENV: &str = "ENSAIO_TOOL_LOG";

const DEFAULT_CONFIG_FILE: &str = "ensaio-tool.toml";
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "ensaio_tool=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite file; in-memory storage when unset.
    pub database_path: Option<PathBuf>,
    /// JSON snapshot loaded at startup when storage is empty.
    pub seed_path: Option<PathBuf>,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            database_path: None,
            seed_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, config file and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Applies `ENSAIO_TOOL_*` values returned by `lookup`; blank values are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get(HTTP_ADDR_ENV) {
            self.http_addr = addr.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: HTTP_ADDR_ENV,
                value: addr.clone(),
            })?;
        }
        if let Some(path) = get(DATABASE_ENV) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get(SEED_ENV) {
            self.seed_path = Some(PathBuf::from(path));
        }
        if let Some(filter) = get(LOG_ENV) {
            self.log_filter = filter;
        }
        Ok(())
    }
}
