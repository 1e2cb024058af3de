//! [`HostClient`] implementation backed by the shared host state.

use crate::commands;
use crate::host::{InputSection, Observer, Shared};
use crate::properties;
use host_types::{
    EventKind, Format, HostClient, HostErrorCode, HostResult, HostValue, InputFlags,
};
use std::path::PathBuf;
use std::sync::Arc;

const LOG_LEVELS: &[&str] = &[
    "no", "fatal", "error", "warn", "info", "status", "v", "debug", "trace", "terse",
];

/// A client handle of a [`crate::HeadlessHost`].
pub struct HeadlessClient {
    name: String,
    shared: Arc<Shared>,
}

impl HeadlessClient {
    pub(crate) fn new(name: String, shared: Arc<Shared>) -> Self {
        Self { name, shared }
    }

    fn call<R>(&self, f: impl FnOnce(&mut crate::host::HostState) -> R) -> R {
        self.shared.with_state(|state| {
            state.calls += 1;
            f(state)
        })
    }
}

impl HostClient for HeadlessClient {
    fn client_name(&self) -> String {
        self.name.clone()
    }

    fn request_event(&self, kind: EventKind, enable: bool) -> HostResult<()> {
        if kind.name().is_none() {
            return Err(HostErrorCode::InvalidParameter);
        }
        self.call(|state| {
            let ids = state.requested_events.entry(self.name.clone()).or_default();
            if enable {
                ids.insert(kind.id());
            } else {
                ids.remove(&kind.id());
            }
        });
        Ok(())
    }

    fn request_log_messages(&self, level: &str) -> HostResult<()> {
        self.call(|state| {
            if !LOG_LEVELS.contains(&level) {
                return Err(HostErrorCode::InvalidParameter);
            }
            state.log_levels.insert(self.name.clone(), level.to_string());
            Ok(())
        })
    }

    fn command(&self, args: &[&str]) -> HostResult<()> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.call(|state| commands::execute(state, &self.name, &args))
            .map(|_| ())
    }

    fn command_string(&self, command: &str) -> HostResult<()> {
        self.call(|state| {
            let args = commands::split_command(command)?;
            commands::execute(state, &self.name, &args)
        })
        .map(|_| ())
    }

    fn command_node(&self, node: &HostValue) -> HostResult<HostValue> {
        self.call(|state| {
            let args = commands::node_args(node)?;
            commands::execute(state, &self.name, &args)
        })
    }

    fn get_property(&self, name: &str, format: Format) -> HostResult<HostValue> {
        self.call(|state| {
            let stored = state
                .properties
                .get(name)
                .ok_or(HostErrorCode::PropertyNotFound)?;
            if stored.is_none() && format != Format::Node {
                return Err(HostErrorCode::PropertyUnavailable);
            }
            properties::read_as(stored, format)
        })
    }

    fn set_property(&self, name: &str, format: Format, value: &HostValue) -> HostResult<()> {
        self.call(|state| {
            let current = state.properties.get(name);
            if current.is_none() && !name.starts_with("user-data/") {
                return Err(HostErrorCode::PropertyNotFound);
            }
            let converted = properties::write_as(current, format, value)?;
            state.store_property(name, converted);
            Ok(())
        })
    }

    fn del_property(&self, name: &str) -> HostResult<()> {
        self.call(|state| {
            if !state.properties.contains_key(name) {
                return Err(HostErrorCode::PropertyNotFound);
            }
            if !name.starts_with("user-data/") {
                return Err(HostErrorCode::PropertyError);
            }
            state.properties.remove(name);
            state.notify_observers(name);
            Ok(())
        })
    }

    fn observe_property(&self, id: u64, name: &str, format: Format) -> HostResult<()> {
        self.call(|state| {
            state.observers.push(Observer {
                client: self.name.clone(),
                id,
                name: name.to_string(),
                format,
            });
            let initial = state
                .properties
                .get(name)
                .and_then(|v| properties::read_as(v, format).ok())
                .unwrap_or_default();
            state.push_event(host_types::HostEvent::property_change(id, name, initial));
            Ok(())
        })
    }

    fn unobserve_property(&self, id: u64) -> HostResult<usize> {
        self.call(|state| {
            let before = state.observers.len();
            state
                .observers
                .retain(|o| !(o.client == self.name && o.id == id));
            Ok(before - state.observers.len())
        })
    }

    fn find_config_file(&self, name: &str) -> Option<PathBuf> {
        self.call(|state| {
            state
                .config_dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|path| path.exists())
        })
    }

    fn define_input_section(
        &self,
        name: &str,
        location: &str,
        contents: &str,
        builtin: bool,
        owner: &str,
    ) {
        self.call(|state| {
            let enabled = state.input_sections.get(name).and_then(|s| s.enabled);
            state.input_sections.insert(
                name.to_string(),
                InputSection {
                    location: location.to_string(),
                    contents: contents.to_string(),
                    builtin,
                    owner: owner.to_string(),
                    enabled,
                },
            );
        });
    }

    fn enable_input_section(&self, name: &str, flags: InputFlags) {
        self.call(|state| {
            if let Some(section) = state.input_sections.get_mut(name) {
                section.enabled = Some(flags);
            }
        });
    }
}
