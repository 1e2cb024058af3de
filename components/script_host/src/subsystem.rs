//! The scripting subsystem entry point.

use crate::dispatch::{DispatchReport, EventLoop};
use crate::lifecycle::{LifecycleManager, Roster, SubsystemError};
use crate::loader::LoadFailure;
use host_types::{HostEvent, ScriptDescriptor};

/// Loaded scripts, ready to run.
///
/// # Examples
///
/// ```
/// use headless_host::HeadlessHost;
/// use host_types::ScriptDescriptor;
/// use script_host::{LifecycleManager, ScriptingConfig, ScriptingSubsystem};
/// use std::rc::Rc;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("hello.rhai");
/// std::fs::write(&path, "fn process_event(kind, payload) {}").unwrap();
///
/// let host = HeadlessHost::new();
/// host.set_shutdown_when_idle(true);
/// let manager = LifecycleManager::new(Rc::new(host), ScriptingConfig::default()).unwrap();
/// let subsystem = ScriptingSubsystem::load(manager, &ScriptDescriptor::for_paths(&[path])).unwrap();
/// assert_eq!(subsystem.roster().len(), 1);
///
/// let report = subsystem.run();
/// assert_eq!(report.failures, 0);
/// ```
pub struct ScriptingSubsystem {
    manager: LifecycleManager,
    roster: Roster,
    failures: Vec<LoadFailure>,
}

impl ScriptingSubsystem {
    /// Load every script; fails only if none of them survives.
    ///
    /// On total failure the host is told that no client is active and the
    /// manager comes back inside the error with its keep-alive context
    /// intact, so the caller decides when to shut it down.
    pub fn load(
        mut manager: LifecycleManager,
        descriptors: &[ScriptDescriptor],
    ) -> Result<Self, SubsystemError> {
        let report = manager.load_all(descriptors);
        if report.roster.is_empty() {
            tracing::error!(attempted = descriptors.len(), "no script loaded");
            manager.host().notify_no_active_client();
            return Err(SubsystemError::NoActiveClient {
                failures: report.failures,
                manager: Box::new(manager),
            });
        }
        Ok(Self {
            manager,
            roster: report.roster,
            failures: report.failures,
        })
    }

    /// Live contexts.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Scripts that were discarded while loading.
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// The lifecycle manager.
    pub fn manager(&self) -> &LifecycleManager {
        &self.manager
    }

    /// Send key bindings and run `flush` hooks.
    pub fn start(&mut self) {
        self.manager.start(&mut self.roster);
    }

    /// Deliver one event outside the loop.
    pub fn dispatch(&mut self, event: &HostEvent) -> DispatchReport {
        let mut event_loop = EventLoop::new(&self.manager, &mut self.roster);
        event_loop.dispatch(event);
        event_loop.report()
    }

    /// Start, dispatch until shutdown, then tear everything down.
    pub fn run(mut self) -> DispatchReport {
        self.start();
        let report = EventLoop::new(&self.manager, &mut self.roster).run();
        self.manager.shutdown(self.roster);
        report
    }
}
