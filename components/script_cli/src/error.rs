//! Error types for the CLI

use headless_host::SetupError;
use script_host::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be used
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Host state file could not be used
    #[error("host setup: {0}")]
    Setup(#[from] SetupError),

    /// Script directory could not be listed
    #[error("failed to list {path}: {source}")]
    ScriptsDir {
        /// Directory that was listed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Neither scripts nor a script directory were given
    #[error("no scripts given")]
    NoScripts,

    /// The scripting subsystem could not be set up
    #[error(transparent)]
    Subsystem(#[from] script_host::SubsystemError),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
