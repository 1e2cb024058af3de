//! Scripting subsystem configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors while loading a [`ScriptingConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid JSON for this config
    #[error("invalid config '{path}': {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// A value is out of range
    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Tunables of the scripting subsystem.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```
/// use script_host::ScriptingConfig;
///
/// let config: ScriptingConfig = serde_json::from_str(r#"{ "stats": true }"#).unwrap();
/// assert!(config.stats);
/// assert_eq!(config.max_value_depth, 128);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptingConfig {
    /// Nesting limit for value conversions
    pub max_value_depth: usize,
    /// Poll timeout of the dispatch loop, in milliseconds
    pub wait_timeout_ms: u64,
    /// Collect per-context statistics for every script
    pub stats: bool,
    /// File extension of script files
    pub script_extension: String,
    /// Maximum script call-stack depth
    pub max_call_levels: usize,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            max_value_depth: value_bridge::DEFAULT_MAX_DEPTH,
            wait_timeout_ms: 1000,
            stats: false,
            script_extension: "rhai".to_string(),
            max_call_levels: 64,
        }
    }
}

impl ScriptingConfig {
    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
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

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_value_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_value_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_call_levels == 0 {
            return Err(ConfigError::Invalid {
                field: "max_call_levels",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.script_extension.is_empty() || self.script_extension.starts_with('.') {
            return Err(ConfigError::Invalid {
                field: "script_extension",
                reason: format!("'{}' is not a bare extension", self.script_extension),
            });
        }
        Ok(())
    }

    /// Poll timeout of the dispatch loop.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Set the value nesting limit.
    pub fn with_max_value_depth(mut self, depth: usize) -> Self {
        self.max_value_depth = depth;
        self
    }

    /// Set the dispatch poll timeout.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable statistics for every context.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats = enabled;
        self
    }
}
