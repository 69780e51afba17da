//! Configuration types for a conversion run.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_LEVEL_SEED;

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_level_seed() -> u64 {
    DEFAULT_LEVEL_SEED
}

/// How long a color table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableScope {
    /// A fresh table per frame. Frames are written as soon as they decode.
    #[default]
    Frame,
    /// One table for every frame of every input. Colors are consistent
    /// across the whole batch, but all frames are buffered before output.
    Global,
}

impl fmt::Display for TableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableScope::Frame => f.write_str("frame"),
            TableScope::Global => f.write_str("global"),
        }
    }
}

impl FromStr for TableScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frame" => Ok(TableScope::Frame),
            "global" => Ok(TableScope::Global),
            other => Err(ConfigError::InvalidScope(other.to_string())),
        }
    }
}

/// Top-level conversion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Color table lifetime.
    #[serde(default)]
    pub scope: TableScope,
    /// Directory output images are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Extension appended to output file names.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Seed for the color table's level generator.
    #[serde(default = "default_level_seed")]
    pub level_seed: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scope: TableScope::default(),
            output_dir: default_output_dir(),
            extension: default_extension(),
            level_seed: DEFAULT_LEVEL_SEED,
        }
    }
}

impl ConvertConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = &self.extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::InvalidExtension(ext.clone()));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid table scope {0:?} (expected \"frame\" or \"global\")")]
    InvalidScope(String),
    #[error("invalid output extension {0:?}")]
    InvalidExtension(String),
}
