// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::FlashMode;
use crate::constants;
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Application directory name under the platform config/data dirs
const APP_DIR: &str = "camerate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// User configuration
///
/// Persisted as JSON. Missing fields fall back to their defaults so older
/// files keep loading after new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flash mode restored at startup
    pub flash_mode: FlashMode,
    /// Upper cap on the zoom factor, applied on top of the device maximum
    pub max_zoom_cap: f32,
    /// Front-camera screen flash hold time before the shutter fires
    pub front_flash_delay_ms: u64,
    /// Accelerometer polling interval
    pub motion_interval_ms: u64,
    /// Max dimension frames are downscaled to before mask analysis
    pub analysis_max_dimension: u32,
    /// Contrast boost for the contour pass
    pub contrast_adjustment: f32,
    /// Contours with this many points or fewer are dropped
    pub min_contour_points: usize,
    /// Max dimension of saved masks
    pub preset_max_dimension: u32,
    /// Max dimension of preset thumbnails
    pub thumbnail_max_dimension: u32,
    /// Writable preset directory (default: data dir / UserPresets)
    pub presets_dir: Option<PathBuf>,
    /// Read-only directory holding built-in masks
    pub bundle_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flash_mode: FlashMode::Auto,
            max_zoom_cap: constants::zoom::MAX_FACTOR_CAP,
            front_flash_delay_ms: constants::capture::FRONT_FLASH_DELAY.as_millis() as u64,
            motion_interval_ms: constants::motion::UPDATE_INTERVAL.as_millis() as u64,
            analysis_max_dimension: constants::mask::ANALYSIS_MAX_DIMENSION,
            contrast_adjustment: constants::mask::CONTRAST_ADJUSTMENT,
            min_contour_points: constants::mask::MIN_CONTOUR_POINTS,
            preset_max_dimension: constants::presets::MAX_DIMENSION,
            thumbnail_max_dimension: constants::presets::THUMBNAIL_MAX_DIMENSION,
            presets_dir: None,
            bundle_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the config from its default location
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load the config from a specific file
    pub fn load_from(path: &std::path::Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                return Self::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
            Self::default()
        })
    }

    /// Write the config to a specific file, creating parent directories
    pub fn save_to(&self, path: &std::path::Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write the config to its default location
    pub fn save(&self) -> AppResult<()> {
        let path = Self::default_path().ok_or("No config directory available")?;
        self.save_to(&path)
    }

    /// Writable preset directory, resolved against the platform data dir
    pub fn presets_dir(&self) -> PathBuf {
        self.presets_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
                .join(APP_DIR)
                .join(constants::presets::USER_FOLDER)
        })
    }

    /// Front-camera flash hold time
    pub fn front_flash_delay(&self) -> Duration {
        Duration::from_millis(self.front_flash_delay_ms)
    }

    /// Motion polling interval
    pub fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.motion_interval_ms.max(1))
    }
}
