//! Application configuration.
//!
//! The configuration is read from a TOML file. Every field is optional, a missing file
//! results in the default configuration.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the serverless functions.
    pub server_url: String,
    /// Directory of the local storage.
    pub data_dir: PathBuf,
    /// Upper bound for a single request, including login.
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8888/.netlify/functions".to_string(),
            data_dir: default_data_dir(),
            request_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fitjournal")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ConfigError::Read(path.to_path_buf(), err)),
        };
        let config: Config = toml::from_str(&content)?;
        config.log_level()?;
        Ok(config)
    }

    /// Location of the configuration file in the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("fitjournal").join(CONFIG_FILE_NAME))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}
