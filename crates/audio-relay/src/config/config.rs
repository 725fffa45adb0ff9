//! Configuration management for audio-relay.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, lazy validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{BehaviourConfig, RecordingConfig, StorageConfig, UploadConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use audio_relay_core::{CaptureConstraints, CloudinarySettings, CoordinatorSettings};
use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const CONFIG_FILE: &str = "config.toml";
const PERMISSION_FILE: &str = "permission.toml";
const SEGMENT_DIR: &str = "segments";
const LOG_DIR: &str = "logs";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Upload destination.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Capture and flush cadence.
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Local segment storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Application behavior settings.
    #[serde(default)]
    pub behavior: BehaviourConfig,
}

impl Config {
    /// Load configuration from the per-user config directory, creating a
    /// default file if none exists.
    ///
    /// Note: This does NOT validate the upload settings. Call
    /// `validate_upload()` before building the uploader so a fresh install
    /// writes its template config and reports what is missing.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, creating defaults there when missing.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if config_path.exists() {
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
        } else {
            info!("No config found, creating default");
            let config = Config::default();
            config.save_to(config_path)?;

            warn!(
                config_path = ?config_path,
                "Default config created. Set upload.cloud_name and upload.upload_preset before recording."
            );

            Ok(config)
        }
    }

    /// Check that the upload destination is filled in.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate_upload(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.upload.cloud_name.trim().is_empty() {
            missing.push("upload.cloud_name");
        }
        if self.upload.upload_preset.trim().is_empty() {
            missing.push("upload.upload_preset");
        }

        if !missing.is_empty() {
            return Err(AppError::ConfigError {
                reason: format!("Missing required settings: {}", missing.join(", ")),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    /// Save configuration using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

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

    /// Directory holding pending segments.
    #[track_caller]
    pub fn segment_dir(&self) -> AppResult<PathBuf> {
        match &self.storage.segment_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join(SEGMENT_DIR)),
        }
    }

    /// Path of the persisted microphone permission record.
    #[track_caller]
    pub fn permission_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join(PERMISSION_FILE))
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join(LOG_DIR))
    }

    /// Coordinator tunables from `[recording]`.
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        let recording = &self.recording;
        CoordinatorSettings {
            flush_interval: Duration::from_secs(recording.flush_interval_secs),
            constraints: CaptureConstraints {
                sample_rate: recording.sample_rate,
                channels: 1,
                fragment_interval: Duration::from_millis(recording.fragment_interval_ms),
            },
            max_buffered_fragments: recording.max_buffered_fragments,
        }
    }

    /// Upload client settings from `[upload]`.
    pub fn cloudinary_settings(&self) -> CloudinarySettings {
        let upload = &self.upload;
        CloudinarySettings {
            cloud_name: upload.cloud_name.trim().to_string(),
            upload_preset: upload.upload_preset.trim().to_string(),
            api_base: upload.api_base.clone(),
            container: upload.container,
            request_timeout: Duration::from_secs(upload.request_timeout_secs),
        }
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "audio-relay", "Audio-Relay").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join(CONFIG_FILE))
    }
}
