//! User settings loaded from `config.json`.
//!
//! The file is optional. Missing keys fall back to defaults, and relative
//! media paths are resolved against the directory holding the file.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::audio::PlayerSettings;
use crate::models::WorkDuration;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "COSYFOCUS_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Looping track played during focus.
    pub ambient_path: PathBuf,
    /// One-shot cue rung on every phase change.
    pub bell_path: PathBuf,
    /// Image blurred behind the progress ring.
    pub background_path: PathBuf,
    pub ambient_volume: f32,
    pub bell_volume: f32,
    /// Focus length selected at startup, in minutes (25, 30 or 35).
    pub work_minutes: u32,
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
    /// Refuse to start without an audio output device.
    pub require_audio: bool,
    /// Edge length of the tray icon in pixels.
    pub icon_size: u32,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ambient_path: PathBuf::from("lofi.mp3"),
            bell_path: PathBuf::from("bell.mp3"),
            background_path: PathBuf::from("background.jpg"),
            ambient_volume: 0.22,
            bell_volume: 0.85,
            work_minutes: 25,
            sound_enabled: true,
            notifications_enabled: true,
            require_audio: true,
            icon_size: 32,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from [`CONFIG_ENV`] or the platform config directory.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads settings from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut settings: Settings =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(base) = path.parent() {
            settings.resolve_paths(base);
        }
        Ok(settings)
    }

    /// The configured focus length, or the default if it is not in the
    /// fixed set.
    pub fn work_duration(&self) -> WorkDuration {
        WorkDuration::from_minutes(self.work_minutes).unwrap_or_else(|| {
            warn!(
                minutes = self.work_minutes,
                "unsupported work duration, using default"
            );
            WorkDuration::default()
        })
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            ambient_path: self.ambient_path.clone(),
            bell_path: self.bell_path.clone(),
            ambient_volume: self.ambient_volume.clamp(0.0, 1.0),
            bell_volume: self.bell_volume.clamp(0.0, 1.0),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.ambient_path,
            &mut self.bell_path,
            &mut self.background_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("com", "cosyfocus", "CosyFocus")
        .map(|dirs| dirs.config_dir().join("config.json"))
}
