//! Wiring of host, configuration and scripts for one CLI run.

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use headless_host::{EventInjector, HeadlessHost, HostSetup};
use host_types::{HostEvent, ScriptDescriptor};
use script_host::{
    discover_scripts, DispatchReport, LifecycleManager, Roster, ScriptingConfig,
    ScriptingSubsystem, SubsystemError,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::rc::Rc;

/// Client name used for commands typed on standard input.
pub const STDIN_CLIENT: &str = "stdin";

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Scripts that loaded
    pub loaded: usize,
    /// Scripts that were discarded
    pub failed: usize,
    /// Dispatch counters
    pub report: DispatchReport,
    /// Lines scripts printed with `print-text`
    pub terminal: Vec<String>,
    /// Texts scripts showed with `show-text`
    pub osd: Vec<String>,
}

/// One line of standard input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Broadcast as a client message
    Message(Vec<String>),
    /// Run as a host command
    Command(Vec<String>),
}

/// Parse a line of standard input.
///
/// `:cmd args...` runs a host command, a JSON array of strings is sent as
/// one message, anything else is split on whitespace.
pub fn parse_line(line: &str) -> Option<InputLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(command) = line.strip_prefix(':') {
        let args: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        return (!args.is_empty()).then_some(InputLine::Command(args));
    }
    if line.starts_with('[') {
        return match serde_json::from_str::<Vec<String>>(line) {
            Ok(args) if !args.is_empty() => Some(InputLine::Message(args)),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed message");
                None
            }
        };
    }
    Some(InputLine::Message(
        line.split_whitespace().map(str::to_string).collect(),
    ))
}

/// Push every line of `reader` into the host, then request shutdown.
pub fn feed<R: BufRead>(reader: R, injector: &EventInjector) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "stopped reading input");
                break;
            }
        };
        match parse_line(&line) {
            Some(InputLine::Message(args)) => injector.push(HostEvent::client_message(&args)),
            Some(InputLine::Command(args)) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                if let Err(code) = injector.command(STDIN_CLIENT, &args) {
                    tracing::warn!(command = %args.join(" "), code = ?code, "command failed");
                }
            }
            None => {}
        }
    }
    injector.push(HostEvent::shutdown());
}

/// Explicit scripts first, then those discovered in the script directory.
pub fn collect_scripts(cli: &Cli, extension: &str) -> CliResult<Vec<PathBuf>> {
    let mut scripts = cli.scripts.clone();
    if let Some(dir) = &cli.scripts_dir {
        let found = discover_scripts(dir, extension).map_err(|source| CliError::ScriptsDir {
            path: dir.clone(),
            source,
        })?;
        scripts.extend(found);
    }
    if scripts.is_empty() {
        return Err(CliError::NoScripts);
    }
    Ok(scripts)
}

/// Everything a run needs, resolved from the command line
pub struct Runner {
    config: ScriptingConfig,
    host: HeadlessHost,
    descriptors: Vec<ScriptDescriptor>,
    feed_stdin: bool,
}

impl Runner {
    /// Resolve configuration, host state and scripts.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut config = match &cli.config {
            Some(path) => ScriptingConfig::from_json_file(path)?,
            None => ScriptingConfig::default(),
        };
        if cli.stats {
            config = config.with_stats(true);
        }
        config.validate()?;

        let host = match &cli.host {
            Some(path) => {
                let setup = HostSetup::from_json_file(path)?;
                let host = setup.build();
                host.set_shutdown_when_idle(setup.shutdown_when_idle || !cli.stdin);
                host
            }
            None => {
                let host = HeadlessHost::new();
                host.set_shutdown_when_idle(!cli.stdin);
                host
            }
        };

        let scripts = collect_scripts(cli, &config.script_extension)?;
        Ok(Self {
            descriptors: ScriptDescriptor::for_paths(&scripts),
            config,
            host,
            feed_stdin: cli.stdin,
        })
    }

    /// The host scripts run against.
    pub fn host(&self) -> &HeadlessHost {
        &self.host
    }

    /// Scripts to load, with their ids.
    pub fn descriptors(&self) -> &[ScriptDescriptor] {
        &self.descriptors
    }

    /// Load, dispatch until shutdown, tear down.
    ///
    /// When no script loads the run ends early with a warning rather than
    /// an error.
    pub fn run(self) -> CliResult<RunSummary> {
        let manager = LifecycleManager::new(Rc::new(self.host.clone()), self.config)?;
        let subsystem = match ScriptingSubsystem::load(manager, &self.descriptors) {
            Ok(subsystem) => subsystem,
            Err(SubsystemError::NoActiveClient {
                failures,
                mut manager,
            }) => {
                tracing::warn!(failed = failures.len(), "no script could be loaded");
                manager.shutdown(Roster::default());
                return Ok(RunSummary {
                    failed: failures.len(),
                    ..RunSummary::default()
                });
            }
            Err(err) => return Err(err.into()),
        };

        if self.feed_stdin {
            let injector = self.host.injector();
            std::thread::spawn(move || feed(std::io::stdin().lock(), &injector));
        }

        let loaded = subsystem.roster().len();
        let failed = subsystem.failures().len();
        let report = subsystem.run();
        Ok(RunSummary {
            loaded,
            failed,
            report,
            terminal: self.host.terminal_output(),
            osd: self.host.osd_messages(),
        })
    }
}
