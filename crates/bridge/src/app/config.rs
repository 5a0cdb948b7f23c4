use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::viewport::LogicalCanvas;

pub const CONFIG_ENV_VAR: &str = "XENGINE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub canvas: LogicalCanvas,
    /// Cadence of the render driver while in continuous drive mode.
    pub frame_interval_ms: u64,
    /// Cadence of the video ticker.
    pub video_tick_ms: u64,
    /// Asset directory that holds video files.
    pub media_dir: String,
    /// Path prefix that routes a file to the save namespace.
    pub save_prefix: String,
    /// Handed to the engine on full initialization.
    pub base_path: Option<PathBuf>,
    pub metrics_log_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            canvas: LogicalCanvas::default(),
            frame_interval_ms: 16,
            video_tick_ms: 33,
            media_dir: "mov".to_string(),
            save_prefix: "sav".to_string(),
            base_path: None,
            metrics_log_interval_ms: 1_000,
        }
    }
}

impl BridgeConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn video_tick(&self) -> Duration {
        Duration::from_millis(self.video_tick_ms.max(1))
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_log_interval_ms.max(1))
    }

    pub fn media_path(&self, name: &str) -> String {
        format!("{}/{}", self.media_dir.trim_end_matches('/'), name)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        if self.save_prefix.is_empty() || self.save_prefix.contains('/') {
            return Err(ConfigError::InvalidSavePrefix(self.save_prefix));
        }
        Ok(self)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at `{field}`: {message}")]
    Parse { field: String, message: String },
    #[error("logical canvas must be non-empty, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("save prefix must be a single non-empty path segment, got {0:?}")]
    InvalidSavePrefix(String),
}

pub fn parse_config(raw: &str) -> Result<BridgeConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: BridgeConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            ConfigError::Parse {
                field: error.path().to_string(),
                message: error.inner().to_string(),
            }
        })?;
    config.validate()
}

pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw)
}
