//! Script host CLI
//!
//! Entry point. Parses arguments, sets up logging and delegates to the
//! Runner.

use clap::Parser;
use script_cli::logging::init_logging;
use script_cli::{Cli, CliError, Runner};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let runner = match Runner::from_cli(&cli) {
        Ok(runner) => runner,
        Err(CliError::NoScripts) => {
            eprintln!("Usage: script-host [SCRIPTS]... [--scripts-dir <DIR>]");
            eprintln!();
            eprintln!("Run 'script-host --help' for more options.");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match runner.run() {
        Ok(summary) => {
            for line in &summary.terminal {
                println!("{}", line);
            }
            tracing::info!(
                loaded = summary.loaded,
                failed = summary.failed,
                events = summary.report.events,
                handler_failures = summary.report.failures,
                "done"
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
