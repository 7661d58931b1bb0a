//! `--config` file support
//!
//! ```toml
//! mapping = "mapping.json"
//! backup = true
//! pretty = false
//! ```
//!
//! Command-line flags override every key.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a `--config` file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid config TOML
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from a `--config` file; unset keys fall back to defaults
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mapping resource for readable keys
    pub mapping: Option<PathBuf>,
    /// Write `<file>.bak` before overwriting a save
    pub backup: Option<bool>,
    /// Indent JSON output
    pub pretty: Option<bool>,
}

impl Config {
    /// Read and parse `path`, resolving a relative `mapping` against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        // Relative mapping paths are relative to the config file
        if let (Some(mapping), Some(dir)) = (config.mapping.as_mut(), path.parent()) {
            if mapping.is_relative() {
                *mapping = dir.join(&*mapping);
            }
        }
        Ok(config)
    }

    /// Whether saves are backed up first (default true)
    pub fn backup(&self) -> bool {
        self.backup.unwrap_or(true)
    }

    /// Whether JSON output is indented (default false)
    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(false)
    }
}
