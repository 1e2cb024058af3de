//! Shared host state and the [`Host`] implementation.

use crate::client::HeadlessClient;
use crate::commands;
use host_types::{
    EventKind, Format, Host, HostClient, HostErrorCode, HostEvent, HostResult, HostValue,
    InputFlags,
};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// One executed command, as recorded in the command log.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// Name of the client that ran the command
    pub client: String,
    /// Command arguments, name first
    pub args: Vec<String>,
}

/// An input section defined by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSection {
    /// Location the section is attached to
    pub location: String,
    /// Bindings in input.conf syntax, one per line
    pub contents: String,
    /// Whether these are builtin (weak) bindings
    pub builtin: bool,
    /// Client that owns the section
    pub owner: String,
    /// Flags of the last enable, `None` while disabled
    pub enabled: Option<InputFlags>,
}

#[derive(Debug, Clone)]
pub(crate) struct Observer {
    pub client: String,
    pub id: u64,
    pub name: String,
    pub format: Format,
}

#[derive(Debug, Default)]
pub(crate) struct HostState {
    pub properties: BTreeMap<String, HostValue>,
    pub observers: Vec<Observer>,
    pub events: VecDeque<HostEvent>,
    pub clients: BTreeSet<String>,
    pub commands: Vec<CommandRecord>,
    pub osd: Vec<String>,
    pub terminal: Vec<String>,
    pub calls: usize,
    pub config_dirs: Vec<PathBuf>,
    pub input_sections: BTreeMap<String, InputSection>,
    pub requested_events: BTreeMap<String, BTreeSet<u32>>,
    pub log_levels: BTreeMap<String, String>,
    pub shutdown_when_idle: bool,
    pub shutdown_sent: bool,
    pub no_active_client: bool,
}

impl HostState {
    pub(crate) fn push_event(&mut self, event: HostEvent) {
        self.events.push_back(event);
    }

    /// Store a property and queue a change event for every observer of it.
    pub(crate) fn store_property(&mut self, name: &str, value: HostValue) {
        self.properties.insert(name.to_string(), value);
        self.notify_observers(name);
    }

    pub(crate) fn notify_observers(&mut self, name: &str) {
        let current = self.properties.get(name).cloned().unwrap_or_default();
        let changes: Vec<HostEvent> = self
            .observers
            .iter()
            .filter(|o| o.name == name)
            .map(|o| {
                let value = crate::properties::read_as(&current, o.format).unwrap_or_default();
                HostEvent::property_change(o.id, name, value)
            })
            .collect();
        self.events.extend(changes);
    }
}

pub(crate) struct Shared {
    pub state: Mutex<HostState>,
    pub ready: Condvar,
}

impl Shared {
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut HostState) -> R) -> R {
        let mut state = self.state.lock();
        let before = state.events.len();
        let result = f(&mut *state);
        if state.events.len() > before {
            self.ready.notify_all();
        }
        result
    }
}

/// Pushes events into a [`HeadlessHost`] from any thread.
#[derive(Clone)]
pub struct EventInjector {
    shared: Arc<Shared>,
}

impl EventInjector {
    /// Queue an event and wake a waiting coordinator.
    pub fn push(&self, event: HostEvent) {
        self.shared.with_state(|state| state.push_event(event));
    }

    /// Run a command as the given client would.
    pub fn command(&self, client: &str, args: &[&str]) -> HostResult<HostValue> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.shared
            .with_state(|state| commands::execute(state, client, &args))
    }
}

/// A host that lives entirely in memory.
///
/// # Examples
///
/// ```
/// use headless_host::HeadlessHost;
/// use host_types::{Format, Host, HostValue};
///
/// let host = HeadlessHost::new();
/// let client = host.create_client("demo").unwrap();
/// client.command(&["set", "pause", "yes"]).unwrap();
/// assert_eq!(client.get_property("pause", Format::Flag).unwrap(), HostValue::Flag(true));
/// ```
#[derive(Clone)]
pub struct HeadlessHost {
    shared: Arc<Shared>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// Host with a small set of default properties.
    pub fn new() -> Self {
        let mut state = HostState::default();
        for (name, value) in [
            ("pause", HostValue::Flag(false)),
            ("volume", HostValue::Double(100.0)),
            ("speed", HostValue::Double(1.0)),
            ("playlist-count", HostValue::Int64(0)),
            ("media-title", HostValue::String(String::new())),
            ("idle-active", HostValue::Flag(true)),
        ] {
            state.properties.insert(name.to_string(), value);
        }
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                ready: Condvar::new(),
            }),
        }
    }

    /// Handle for pushing events from another thread.
    pub fn injector(&self) -> EventInjector {
        EventInjector {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Queue an event.
    pub fn push_event(&self, event: HostEvent) {
        self.injector().push(event);
    }

    /// Set a property without running a command or notifying observers.
    pub fn insert_property(&self, name: &str, value: HostValue) {
        self.shared
            .with_state(|state| state.properties.insert(name.to_string(), value));
    }

    /// Add a directory searched by `find_config_file`.
    pub fn add_config_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.shared.with_state(|state| state.config_dirs.push(dir));
    }

    /// Deliver a shutdown event once the queue runs dry.
    pub fn set_shutdown_when_idle(&self, enabled: bool) {
        self.shared
            .with_state(|state| state.shutdown_when_idle = enabled);
    }

    /// Current value of a property.
    pub fn property(&self, name: &str) -> Option<HostValue> {
        self.shared.with_state(|state| state.properties.get(name).cloned())
    }

    /// Every command executed so far.
    pub fn command_log(&self) -> Vec<CommandRecord> {
        self.shared.with_state(|state| state.commands.clone())
    }

    /// Messages shown with `show-text`.
    pub fn osd_messages(&self) -> Vec<String> {
        self.shared.with_state(|state| state.osd.clone())
    }

    /// Lines written with `print-text`.
    pub fn terminal_output(&self) -> Vec<String> {
        self.shared.with_state(|state| state.terminal.clone())
    }

    /// Number of client API calls received so far.
    pub fn call_count(&self) -> usize {
        self.shared.with_state(|state| state.calls)
    }

    /// Events queued but not yet consumed.
    pub fn pending_events(&self) -> usize {
        self.shared.with_state(|state| state.events.len())
    }

    /// Whether scripting told the host it has no active client.
    pub fn no_active_client_signalled(&self) -> bool {
        self.shared.with_state(|state| state.no_active_client)
    }

    /// A defined input section.
    pub fn input_section(&self, name: &str) -> Option<InputSection> {
        self.shared
            .with_state(|state| state.input_sections.get(name).cloned())
    }

    /// Event ids a client enabled with `request_event`.
    pub fn requested_events(&self, client: &str) -> Vec<u32> {
        self.shared.with_state(|state| {
            state
                .requested_events
                .get(client)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default()
        })
    }

    /// Log level a client subscribed to.
    pub fn log_level(&self, client: &str) -> Option<String> {
        self.shared
            .with_state(|state| state.log_levels.get(client).cloned())
    }

    /// Names of every client created so far.
    pub fn client_names(&self) -> Vec<String> {
        self.shared
            .with_state(|state| state.clients.iter().cloned().collect())
    }
}

impl Host for HeadlessHost {
    fn create_client(&self, name: &str) -> HostResult<Rc<dyn HostClient>> {
        if name.is_empty() {
            return Err(HostErrorCode::InvalidParameter);
        }
        let registered = self.shared.with_state(|state| {
            let mut candidate = name.to_string();
            let mut n = 2;
            while state.clients.contains(&candidate) {
                candidate = format!("{}{}", name, n);
                n += 1;
            }
            state.clients.insert(candidate.clone());
            candidate
        });
        tracing::debug!(client = %registered, "client created");
        Ok(Rc::new(HeadlessClient::new(registered, Arc::clone(&self.shared))))
    }

    fn wait_event(&self, timeout: Duration) -> HostEvent {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(event) = state.events.pop_front() {
                if event.kind == EventKind::Shutdown {
                    state.shutdown_sent = true;
                }
                return event;
            }
            if state.shutdown_when_idle && !state.shutdown_sent {
                state.shutdown_sent = true;
                return HostEvent::shutdown();
            }
            if self.shared.ready.wait_for(&mut state, timeout).timed_out() {
                return state.events.pop_front().unwrap_or_else(HostEvent::idle);
            }
        }
    }

    fn notify_no_active_client(&self) {
        tracing::warn!("scripting has no active client");
        self.shared
            .with_state(|state| state.no_active_client = true);
    }
}
