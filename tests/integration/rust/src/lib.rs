//! Integration test suite for the scripting subsystem
//!
//! This crate verifies that the host types, the value bridge, the script
//! host and the headless host work together across component boundaries.

use headless_host::HeadlessHost;
use host_types::ScriptDescriptor;
use script_host::{
    CaptureSink, LifecycleManager, LogSink, ScriptingConfig, ScriptingSubsystem, SubsystemError,
};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Re-export components for test convenience
pub mod components {
    pub use headless_host;
    pub use host_types;
    pub use script_host;
    pub use value_bridge;
}

/// Scripts on disk plus the host they will run against.
pub struct Fixture {
    dir: TempDir,
    paths: Vec<PathBuf>,
    /// Host shared with the subsystem
    pub host: HeadlessHost,
    /// Log sink every script writes to
    pub sink: CaptureSink,
}

impl Fixture {
    /// Empty fixture with a fresh host.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            paths: Vec::new(),
            host: HeadlessHost::new(),
            sink: CaptureSink::new(),
        }
    }

    /// Add a script named `name` with the given source.
    pub fn script(mut self, name: &str, source: &str) -> Self {
        let path = self.dir.path().join(format!("{}.rhai", name));
        std::fs::write(&path, source).expect("write script");
        self.paths.push(path);
        self
    }

    /// Descriptors for every added script, in order.
    pub fn descriptors(&self) -> Vec<ScriptDescriptor> {
        ScriptDescriptor::for_paths(&self.paths)
    }

    /// Load every script into a new subsystem.
    pub fn load(&self) -> Result<ScriptingSubsystem, SubsystemError> {
        let sink = self.sink.clone();
        let manager = LifecycleManager::new(Rc::new(self.host.clone()), ScriptingConfig::default())?
            .with_sink_factory(move |_| -> Rc<dyn LogSink> { Rc::new(sink.clone()) });
        ScriptingSubsystem::load(manager, &self.descriptors())
    }

    /// Load, then run until the event queue is drained.
    pub fn run(&self) -> script_host::DispatchReport {
        self.host.set_shutdown_when_idle(true);
        self.load().expect("at least one script loads").run()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
