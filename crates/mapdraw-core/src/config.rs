//! Map configuration loaded from a JSON file.

use crate::measure::MeasureMethod;
use crate::scale::ScaleLineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid config: {0}")]
    Parse(String),
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Root of the feature REST API.
    pub api_base_url: String,
    /// Initial view center as `[lon, lat]`.
    pub center: [f64; 2],
    pub zoom: f64,
    pub measure_method: MeasureMethod,
    pub scale: ScaleLineOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            center: [37.6173, 55.7558],
            zoom: 16.0,
            measure_method: MeasureMethod::Geodesic,
            scale: ScaleLineOptions::default(),
        }
    }
}

impl MapConfig {
    /// Default config file: `<config dir>/mapdraw/config.json`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapdraw").join("config.json"))
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, self.to_json()?)
            .map_err(|e| ConfigError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// The API base as a validated http(s) URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api_base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(invalid(format!("unsupported scheme '{}'", scheme))),
        }
    }
}
