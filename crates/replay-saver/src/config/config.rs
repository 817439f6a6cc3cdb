//! Configuration management for replay-saver.
//!
//! Handles loading and saving the TOML settings file with cross-platform
//! paths and atomic write operations, and converts the stored values into
//! the validated core types.

use crate::{
    AppError, AppResult,
    config::{HotkeyConfig, ObsConfig, TimingConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use replay_saver_core::{ConnectionConfig, OperationTiming};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// OBS connection settings.
    #[serde(default)]
    pub obs: ObsConfig,
    /// Hotkey binding.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Delays and timeouts.
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Config {
    /// Load configuration from disk.
    ///
    /// A missing file yields empty settings; call [`Config::missing_fields`]
    /// to find out what still has to be asked for.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    #[track_caller]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!(config_path = ?config_path, "No config found, starting with empty settings");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to disk using atomic write pattern.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Names of the settings that are absent or blank.
    ///
    /// An absent password counts as missing; an empty one means "no auth".
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.obs.host.as_deref().is_none_or(|h| h.trim().is_empty()) {
            missing.push("host");
        }
        if self.obs.port.is_none_or(|p| p == 0) {
            missing.push("port");
        }
        if self.obs.password.is_none() {
            missing.push("password");
        }
        if self.hotkey.save.as_deref().is_none_or(|h| h.trim().is_empty()) {
            missing.push("hotkey");
        }

        missing
    }

    /// Build the validated connection settings.
    #[track_caller]
    pub fn connection(&self) -> AppResult<ConnectionConfig> {
        let host = self.obs.host.clone().unwrap_or_default();
        let port = self.obs.port.unwrap_or_default();

        Ok(ConnectionConfig::new(host, port, self.obs.password.clone())?)
    }

    /// The hotkey binding string.
    #[track_caller]
    pub fn hotkey_binding(&self) -> AppResult<&str> {
        match self.hotkey.save.as_deref().map(str::trim) {
            Some(binding) if !binding.is_empty() => Ok(binding),
            _ => Err(AppError::ConfigError {
                reason: "No hotkey configured".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Timing profile for replay saves.
    pub fn operation_timing(&self) -> OperationTiming {
        self.timing.operation_timing()
    }

    /// Location of the settings file, creating its directory if needed.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    pub(crate) fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "replay-saver", "Replay Saver").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}
