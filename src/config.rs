//! Configuration loading.
//!
//! Configuration is loaded from a TOML file with the following resolution order:
//! 1. explicit path (e.g. `--config <path>`)
//! 2. `$GLEIPNIR_CONFIG`
//! 3. built-in defaults
//!
//! Every field is optional:
//!
//! ```toml
//! [relay]
//! limit = 10
//!
//! [stream]
//! buffer = 16
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::stream::DEFAULT_STREAM_BUFFER;
use crate::{GleipnirError, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "GLEIPNIR_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Limit stage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Maximum items (and total demand) passed through (default: 128).
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> u64 {
    128
}

/// Async stream bridge settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Items prefetched ahead of the consumer (default: 64).
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer: default_buffer(),
        }
    }
}

fn default_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

impl Config {
    /// Load configuration, following the resolution order above.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        match path {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GleipnirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| GleipnirError::Configuration(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.stream.buffer == 0 {
            return Err(GleipnirError::Configuration(
                "stream.buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
