//! Configuration for the camera rig.
//!
//! Provides loading, saving, and validation of rig settings: preview
//! fallbacks and worker-thread behavior.

use crate::errors::CameraError;
use crate::types::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    pub preview: PreviewSettings,
    pub ops: OpsSettings,
}

/// Preview behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Size bound when a device reports no supported sizes [width, height].
    pub fallback_resolution: [u32; 2],
    /// Restart an active preview when the selected size changes.
    pub restart_on_size_change: bool,
}

/// Worker-thread controller behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsSettings {
    /// Upper bound on waiting for a device to reach idle, in milliseconds.
    pub idle_wait_timeout_ms: u64,
    /// Bound of the still-capture event channel.
    pub capture_event_capacity: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            fallback_resolution: [
                Size::DEFAULT_PREVIEW.width,
                Size::DEFAULT_PREVIEW.height,
            ],
            restart_on_size_change: true,
        }
    }
}

impl Default for OpsSettings {
    fn default() -> Self {
        Self {
            idle_wait_timeout_ms: 5000,
            capture_event_capacity: 8,
        }
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            preview: PreviewSettings::default(),
            ops: OpsSettings::default(),
        }
    }
}

impl RigConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: RigConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("camrig.toml")
    }

    /// Load from the default location, falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn fallback_preview_size(&self) -> Size {
        Size::new(
            self.preview.fallback_resolution[0],
            self.preview.fallback_resolution[1],
        )
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.preview.fallback_resolution[0] == 0 || self.preview.fallback_resolution[1] == 0 {
            return Err("Invalid fallback resolution".to_string());
        }
        if self.ops.idle_wait_timeout_ms == 0 || self.ops.idle_wait_timeout_ms > 60_000 {
            return Err("Idle wait timeout must be 1-60000 ms".to_string());
        }
        if self.ops.capture_event_capacity == 0 || self.ops.capture_event_capacity > 1024 {
            return Err("Capture event capacity must be 1-1024".to_string());
        }
        Ok(())
    }
}
