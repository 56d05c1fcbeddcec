//! Dispatch configuration file and environment variable support.
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! [engine]
//! conflict_retries = 1
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::repository::RepositoryError;

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "DISPATCH_CONFIG";
pub const CONFLICT_RETRIES_ENV: &str = "DISPATCH_CONFLICT_RETRIES";
pub const LOG_LEVEL_ENV: &str = "DISPATCH_LOG_LEVEL";

/// Top-level dispatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Assignment engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Extra Assign attempts after losing a claim race.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            conflict_retries: default_conflict_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_conflict_retries() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DispatchConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(DispatchConfig)` if successful
    /// * `Err(RepositoryError::ConfigurationError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `dispatch.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        match Self::default_path() {
            Some(path) => Self::from_file(path),
            None => Err(RepositoryError::configuration(
                "No dispatch.toml found in standard locations",
            )),
        }
    }

    fn default_path() -> Option<PathBuf> {
        [
            PathBuf::from("dispatch.toml"),
            PathBuf::from("backend/dispatch.toml"),
            PathBuf::from("../dispatch.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Resolve configuration from the environment.
    ///
    /// # Environment Variables
    /// - `DISPATCH_CONFIG` (optional): path to a TOML file; when unset the
    ///   default locations are searched, falling back to built-in defaults
    ///   only if no file exists there
    /// - `DISPATCH_CONFLICT_RETRIES` (optional): overrides `engine.conflict_retries`
    /// - `DISPATCH_LOG_LEVEL` (optional): overrides `logging.level`
    ///
    /// # Errors
    /// Returns an error if the selected config file is unusable or an override
    /// does not parse.
    pub fn from_env() -> Result<Self, RepositoryError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => match Self::default_path() {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };

        if let Ok(retries) = env::var(CONFLICT_RETRIES_ENV) {
            config.engine.conflict_retries = retries.trim().parse().map_err(|_| {
                RepositoryError::configuration(format!(
                    "{} must be a non-negative integer, got {:?}",
                    CONFLICT_RETRIES_ENV, retries
                ))
            })?;
        }
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                config.logging.level = level.trim().to_string();
            }
        }

        Ok(config)
    }
}
