//! Configuration file handling for edgeviewer.
//!
//! Loads configuration from `~/.config/edgeviewer/config.toml` or a custom
//! path; CLI flags override file values.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::transform::{
    TransformConfig, DEFAULT_HYSTERESIS_HIGH, DEFAULT_HYSTERESIS_LOW, DEFAULT_SOBEL_THRESHOLD,
};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub transform: TransformSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Debug, Deserialize)]
pub struct SourceSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct TransformSection {
    /// Mode name: identity, grayscale, sobel, hysteresis
    #[serde(default)]
    pub mode: Option<String>,
    /// Sobel threshold (applied to magnitude >> 3)
    #[serde(default)]
    pub threshold: Option<u32>,
    /// Hysteresis low threshold
    #[serde(default)]
    pub low: Option<u32>,
    /// Hysteresis high threshold
    #[serde(default)]
    pub high: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RelaySection {
    /// Push endpoint; the relay is disabled when unset
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_relay_every")]
    pub every: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_fps() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    16
}

fn default_relay_every() -> u64 {
    60
}

fn default_jpeg_quality() -> u8 {
    60
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            url: None,
            every: default_relay_every(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

impl TransformSection {
    /// Resolve the section into a concrete transform config.
    ///
    /// Unset fields fall back to the mode's defaults; an unknown mode name
    /// is an error.
    pub fn resolve(&self) -> Result<TransformConfig, ConfigError> {
        let mode = self.mode.as_deref().unwrap_or("sobel");
        let base = TransformConfig::from_str(mode).ok_or_else(|| ConfigError::UnknownMode {
            mode: mode.to_string(),
        })?;
        Ok(match base {
            TransformConfig::Sobel { .. } => TransformConfig::Sobel {
                threshold: self.threshold.unwrap_or(DEFAULT_SOBEL_THRESHOLD),
            },
            TransformConfig::Hysteresis { .. } => TransformConfig::Hysteresis {
                low: self.low.unwrap_or(DEFAULT_HYSTERESIS_LOW),
                high: self.high.unwrap_or(DEFAULT_HYSTERESIS_HIGH),
            },
            other => other,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown transform mode '{mode}' (expected identity, grayscale, sobel, or hysteresis)")]
    UnknownMode { mode: String },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("edgeviewer/config.toml")
}
