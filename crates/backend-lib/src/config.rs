// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides, e.g. `BALANCE_GATEWAY_STORAGE__PATH`
pub const ENV_PREFIX: &str = "BALANCE_GATEWAY_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Account store settings
    pub storage: StorageSettings,
    /// HTTP transport limits
    pub http: HttpSettings,
}

/// Which account store to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// One JSON record per account under `storage.path`
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Data directory path
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Per-request deadline
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            storage: StorageSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 30,
        }
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Settings {
    /// Load from `config.toml` in the working directory plus environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file plus environment overrides.
    /// A missing file leaves the defaults in place.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!(
                "invalid log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        if self.storage.backend == StorageBackend::File && self.storage.path.as_os_str().is_empty() {
            bail!("storage.path must not be empty for the file backend");
        }
        if self.http.max_body_bytes == 0 {
            bail!("http.max_body_bytes must be greater than zero");
        }
        if self.http.request_timeout_secs == 0 {
            bail!("http.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
