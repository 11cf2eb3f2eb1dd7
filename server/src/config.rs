//! Server configuration, loaded from an optional JSON file.

use crate::auth::StaticCredential;
use rangepage_engine::{EngineConfig, ModePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite database file. `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    pub products_table: String,
    pub orders_table: String,
    /// Per-request deadline in milliseconds.
    pub request_timeout_ms: u64,
    pub engine: EngineConfig,
    pub products_mode: ModePolicy,
    /// Role a credential must carry to read order history (case-insensitive).
    pub client_role: String,
    pub credentials: Vec<StaticCredential>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4100,
            database: None,
            products_table: "productos".into(),
            orders_table: "pedidos".into(),
            request_timeout_ms: 15_000,
            engine: EngineConfig::default(),
            products_mode: ModePolicy::Strict,
            client_role: "cliente".into(),
            credentials: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Reads a config file; keys it omits keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}
