//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Run scripts against an in-memory host
#[derive(Debug, Parser)]
#[command(name = "script-host", version, about)]
pub struct Cli {
    /// Script files or script directories, loaded in the given order
    pub scripts: Vec<PathBuf>,

    /// Also load every script found in this directory
    #[arg(short = 'd', long)]
    pub scripts_dir: Option<PathBuf>,

    /// Scripting configuration (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial host state (JSON)
    #[arg(long)]
    pub host: Option<PathBuf>,

    /// Read client messages from standard input until EOF
    #[arg(long)]
    pub stdin: bool,

    /// Collect per-script statistics
    #[arg(long)]
    pub stats: bool,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    pub log: Option<String>,
}
