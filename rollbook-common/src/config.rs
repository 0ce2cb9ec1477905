//! Configuration loading and data directory resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ROLLBOOK_DATA_DIR";

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address for the HTTP listener
    pub host: String,
    /// Bind port for the HTTP listener
    pub port: u16,
    /// Directory holding rollbook.db
    pub data_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5810,
            data_dir: default_data_dir(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration with the resolution priority:
    /// 1. Environment variable (data dir only)
    /// 2. TOML config file
    /// 3. Compiled defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(path) = find_config_file() {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                    if let Some(host) = value.get("host").and_then(|v| v.as_str()) {
                        config.host = host.to_string();
                    }
                    if let Some(port) = value.get("port").and_then(|v| v.as_integer()) {
                        config.port = port as u16;
                    }
                    if let Some(dir) = value.get("data_dir").and_then(|v| v.as_str()) {
                        config.data_dir = PathBuf::from(dir);
                    }
                }
            }
        }

        // Environment variable wins over the config file
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("rollbook.db")
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Locate the platform config file (~/.config/rollbook/config.toml on
/// Linux, falling back to /etc/rollbook/config.toml)
fn find_config_file() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("rollbook").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/rollbook/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rollbook"))
        .unwrap_or_else(|| PathBuf::from("./rollbook_data"))
}
