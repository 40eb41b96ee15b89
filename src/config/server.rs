use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use super::{PasswordParams, StoreConfig};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot file location. An empty path runs the store in memory only.
    pub snapshot_path: PathBuf,
    /// Session lifetime in seconds. Unset means sessions never expire.
    pub session_ttl_secs: Option<u64>,
    pub password: PasswordParams,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Reads a TOML config file. Missing keys fall back to the defaults.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn store_config(&self) -> Result<StoreConfig> {
        let session_ttl = match self.session_ttl_secs {
            Some(secs) => {
                let ttl = i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| Error::Config("session_ttl_secs is too large".to_string()))?;
                Some(ttl)
            }
            None => None,
        };

        Ok(StoreConfig {
            snapshot_path: StoreConfig::normalize_path(&self.snapshot_path),
            session_ttl,
            password: self.password.clone(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            snapshot_path: PathBuf::from("./data/novella.json"),
            session_ttl_secs: None,
            password: PasswordParams::default(),
        }
    }
}
