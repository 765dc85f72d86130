//! Configuration file loader.

use std::path::{Path, PathBuf};

use crate::parser::{LocalizationError, LocalizationTable};

use super::RunnerConfig;

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
    /// The single path was given explicitly and must exist.
    explicit: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .mstest-runner.toml
        search_paths.push(PathBuf::from(".mstest-runner.toml"));

        // 2. User config directory: ~/.config/mstest-runner/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("mstest-runner").join("config.toml"));
        }

        Self {
            search_paths,
            explicit: false,
        }
    }

    /// Create a config loader with a specific config file path.
    ///
    /// Unlike the default search, a missing file is an error.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
            explicit: true,
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// holds invalid values, or if an explicit path does not exist.
    pub fn load(&self) -> Result<RunnerConfig, ConfigError> {
        if self.explicit {
            if let Some(path) = self.search_paths.first() {
                return Self::load_from_path(path);
            }
        }

        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(RunnerConfig::default())
    }

    fn load_from_path(path: &Path) -> Result<RunnerConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RunnerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        if config.channel_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                path: path.to_path_buf(),
                message: "channel_buffer must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the localization table named by `config`, or the built-in one.
///
/// # Errors
///
/// Returns an error if the configured file cannot be read or parsed.
pub fn load_localization(config: &RunnerConfig) -> Result<LocalizationTable, ConfigError> {
    let Some(path) = &config.localization_file else {
        return Ok(LocalizationTable::builtin());
    };
    tracing::debug!(path = %path.display(), "Loading localization table");

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    LocalizationTable::from_json(&content).map_err(|e| ConfigError::Localization {
        path: path.clone(),
        source: e,
    })
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    InvalidValue { path: PathBuf, message: String },

    #[error("Failed to load localization table {path}: {source}")]
    Localization {
        path: PathBuf,
        source: LocalizationError,
    },
}
