//! Script host CLI library
//!
//! Argument parsing, logging setup and the runner that loads scripts into
//! the scripting subsystem against an in-memory host.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod runner;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runner::{RunSummary, Runner};
