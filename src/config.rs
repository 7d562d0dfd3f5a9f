//! TOML configuration for both demos.
//!
//! Every section and field is optional; anything missing falls back to the
//! defaults below. A missing file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pseudolab_helpers::DistanceMetric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pseudolab.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub labeling: LabelingSettings,
    pub rotation: RotationSettings,
    pub images: ImageSettings,
}

/// Settings for the pseudo-labeling demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingSettings {
    /// How many labels a classification keeps, most confident first.
    pub top_k: usize,
    /// How many classifications the history log remembers.
    pub history_limit: usize,
}

impl Default for LabelingSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            history_limit: 50,
        }
    }
}

/// Settings for the rotation-prediction loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Per-class example count above which the whole example store is reset.
    pub example_cap: usize,
    /// Neighbors consulted per prediction.
    pub k: usize,
    /// Pause between iterations, in milliseconds.
    pub delay_ms: u64,
    /// Side length of the rendered square crops.
    pub crop_size: u32,
    /// Side length of the luminance grid used by the built-in embedder.
    pub embedding_grid: u32,
    pub distance: DistanceMetric,
    /// Fixes the random image/rotation picks for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            example_cap: 400,
            k: 3,
            delay_ms: 0,
            crop_size: 224,
            embedding_grid: 16,
            distance: DistanceMetric::Euclidean,
            seed: None,
        }
    }
}

impl RotationSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Where the fixed default image set lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub default_dir: PathBuf,
    /// Number of `catN.png` files in the default set.
    pub default_count: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("images"),
            default_count: 10,
        }
    }
}

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DemoConfig {
    /// Load configuration from `path`, returning defaults if the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let data = toml::to_string_pretty(self).map_err(|source| ConfigError::SerializeToml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, data).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the demos cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("labeling.top_k", self.labeling.top_k),
            ("rotation.example_cap", self.rotation.example_cap),
            ("rotation.k", self.rotation.k),
            ("rotation.crop_size", self.rotation.crop_size as usize),
            ("rotation.embedding_grid", self.rotation.embedding_grid as usize),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.rotation.embedding_grid > self.rotation.crop_size {
            return Err(ConfigError::Invalid {
                field: "rotation.embedding_grid",
                reason: format!(
                    "{} is larger than the crop size {}",
                    self.rotation.embedding_grid, self.rotation.crop_size
                ),
            });
        }
        Ok(())
    }
}
