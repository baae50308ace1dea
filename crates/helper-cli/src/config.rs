use std::fs;
use std::path::Path;
use std::path::PathBuf;

use helper_core::config::AppConfig;
use helper_core::persistence::STORE_FILE_NAME;
use thiserror::Error;

pub const APP_DIR: &str = "devops-helper";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "devops-helper.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `~/.config/devops-helper/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Loads the config file. A missing or empty file yields defaults.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Command-line `--store` wins over the config file, which wins over the
/// platform data directory.
pub fn resolve_store_path(config: &AppConfig, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(|| data_dir().join(STORE_FILE_NAME))
}
