use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ladder_log::{LogConfig, SyncMode};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log: LogSettings,
    /// Send `Access-Control-Allow-Origin: *` so browser clients on other
    /// origins can call the API.
    pub allow_any_origin: bool,
    /// Matches returned by `GET /v1/matches` without a `limit`.
    pub recent_matches_limit: usize,
    /// Upper bound applied to any requested `limit`.
    pub max_recent_matches: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            log: LogSettings::default(),
            allow_any_origin: true,
            recent_matches_limit: 10,
            max_recent_matches: 100,
        }
    }
}

impl ServerConfig {
    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        if config.max_recent_matches == 0 {
            return Err(ServerError::Config(
                "max_recent_matches must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    /// Clamp a requested page size to the configured bounds.
    pub fn recent_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.recent_matches_limit)
            .min(self.max_recent_matches)
    }
}

/// Where the transaction log lives and how it is synced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub path: PathBuf,
    pub sync_mode: SyncMode,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/transaction_log.jsonl"),
            sync_mode: SyncMode::default(),
        }
    }
}

impl LogSettings {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            sync_mode: self.sync_mode,
        }
    }
}
