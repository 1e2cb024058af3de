//! The host API surface bound to one context.
//!
//! [`ScriptApi`] is the object scripts see as `mp` (and as `this` inside
//! hooks). Every call forwards to the context's own [`HostClient`] and is
//! only valid while the context holds the baton; calls made at any other
//! time fail with [`ScriptError::Inactive`] before reaching the host.

use crate::log::LogSink;
use crate::stats::ContextStats;
use host_types::{
    ContextId, EventKind, Format, HostClient, HostErrorCode, HostValue, InputFlags, LogLevel,
    ScriptError, MAX_COMMAND_ARGS,
};
use rhai::{Dynamic, Map};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use value_bridge::Bridge;

/// Separator between client name and binding name in `script-binding` targets.
pub const BINDING_SEPARATOR: &str = "___";

/// An observed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Property name
    pub name: String,
    /// Format the value is delivered in
    pub format: Format,
}

/// A key binding registered with `add_binding`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// Input line in input.conf syntax, if a key was given
    pub input: Option<String>,
    /// Whether the binding goes into the builtin section
    pub builtin: bool,
    /// Script function invoked when the key is released
    pub callback: String,
}

/// Outcome of `request_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The host applied the request
    Applied,
    /// No event of that name exists; nothing was sent to the host
    Unknown,
}

/// A script function the dispatcher should invoke for a client message.
#[derive(Debug, Clone)]
pub struct PendingCallback {
    /// Function name
    pub function: String,
    /// Arguments to pass
    pub args: Vec<Dynamic>,
}

/// An input section this context defined on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedSection {
    /// Location the section was defined at
    pub location: String,
    /// Whether it is a builtin section
    pub builtin: bool,
    /// Owner the host attributes the section to
    pub owner: String,
}

#[derive(Default)]
struct ClientState {
    subscriptions: BTreeMap<u64, Subscription>,
    sections: BTreeMap<String, DefinedSection>,
    bindings: BTreeMap<String, KeyBinding>,
    next_binding: u64,
    script_messages: BTreeMap<String, String>,
    extension: Map,
    stats: Option<ContextStats>,
}

struct ClientInner {
    id: ContextId,
    name: String,
    client: Rc<dyn HostClient>,
    log: Rc<dyn LogSink>,
    bridge: Bridge,
    active: Cell<bool>,
    state: RefCell<ClientState>,
}

/// Host API handle of one context.
///
/// Clones share the same client, log sink and state.
#[derive(Clone)]
pub struct ScriptApi {
    inner: Rc<ClientInner>,
}

impl std::fmt::Debug for ScriptApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptApi")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("active", &self.inner.active.get())
            .finish()
    }
}

impl ScriptApi {
    /// Bind a context to its host client.
    pub fn new(
        id: ContextId,
        client: Rc<dyn HostClient>,
        log: Rc<dyn LogSink>,
        bridge: Bridge,
    ) -> Self {
        let name = client.client_name();
        Self {
            inner: Rc::new(ClientInner {
                id,
                name,
                client,
                log,
                bridge,
                active: Cell::new(false),
                state: RefCell::new(ClientState::default()),
            }),
        }
    }

    /// Permanent id of the owning context.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Client name the host registered.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the owning context currently holds the baton.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.inner.active.set(active);
    }

    /// The bridge used for every conversion of this context.
    pub fn bridge(&self) -> Bridge {
        self.inner.bridge
    }

    /// Whether two handles belong to the same context.
    pub fn same_context(&self, other: &ScriptApi) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_active(&self) -> Result<(), ScriptError> {
        if self.inner.active.get() {
            Ok(())
        } else {
            Err(ScriptError::Inactive)
        }
    }

    /// Baton check plus host-call accounting.
    fn enter(&self) -> Result<&dyn HostClient, ScriptError> {
        self.ensure_active()?;
        if let Some(stats) = self.inner.state.borrow_mut().stats.as_mut() {
            stats.record_host_call();
        }
        Ok(self.inner.client.as_ref())
    }

    fn host_error(&self, code: HostErrorCode, subject: &str) -> ScriptError {
        match code {
            HostErrorCode::PropertyNotFound => ScriptError::NotFound(format!(
                "{}: {}",
                subject,
                self.inner.client.error_string(code)
            )),
            _ => ScriptError::Host(self.inner.client.error_string(code)),
        }
    }

    /// Run a command line.
    pub fn command_string(&self, text: &str) -> Result<(), ScriptError> {
        self.enter()?
            .command_string(text)
            .map_err(|code| self.host_error(code, text))
    }

    /// Run a command given as separate arguments.
    ///
    /// At most [`MAX_COMMAND_ARGS`] arguments are accepted; a longer vector
    /// fails with [`ScriptError::Capacity`] without calling the host.
    pub fn commandv(&self, args: &[String]) -> Result<(), ScriptError> {
        self.ensure_active()?;
        if args.len() > MAX_COMMAND_ARGS {
            return Err(ScriptError::Capacity {
                given: args.len(),
                max: MAX_COMMAND_ARGS,
            });
        }
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let subject = refs.first().copied().unwrap_or_default();
        self.enter()?
            .command(&refs)
            .map_err(|code| self.host_error(code, subject))
    }

    /// Run a command given as a value tree and return its result.
    pub fn command_node(&self, node: &Dynamic) -> Result<Dynamic, ScriptError> {
        self.ensure_active()?;
        let bridge = self.inner.bridge;
        let host_node = bridge.to_host(node)?;
        let result = self
            .enter()?
            .command_node(&host_node)
            .map_err(|code| self.host_error(code, "command"))?;
        Ok(bridge.from_host(&result)?)
    }

    /// Read a property.
    pub fn get_property(&self, name: &str, format: Format) -> Result<Dynamic, ScriptError> {
        let value = self
            .enter()?
            .get_property(name, format)
            .map_err(|code| self.host_error(code, name))?;
        Ok(self.inner.bridge.from_host(&value)?)
    }

    /// Write a property.
    ///
    /// Typed formats require a script value of the matching kind; string
    /// formats accept any scalar and send its text form.
    pub fn set_property(&self, name: &str, format: Format, value: &Dynamic) -> Result<(), ScriptError> {
        self.ensure_active()?;
        let host_value = self.typed_value(format, value)?;
        self.enter()?
            .set_property(name, format, &host_value)
            .map_err(|code| self.host_error(code, name))
    }

    fn typed_value(&self, format: Format, value: &Dynamic) -> Result<HostValue, ScriptError> {
        let mismatch = || {
            ScriptError::TypeMismatch(format!(
                "cannot use a value of type '{}' as {}",
                value.type_name(),
                format
            ))
        };
        match format {
            Format::Node => Ok(self.inner.bridge.to_host(value)?),
            Format::String | Format::OsdString => {
                if value.is_array() || value.is_map() || value.is_unit() {
                    Err(mismatch())
                } else {
                    Ok(HostValue::String(value.to_string()))
                }
            }
            Format::Flag => value.as_bool().map(HostValue::Flag).map_err(|_| mismatch()),
            Format::Int64 => value.as_int().map(HostValue::Int64).map_err(|_| mismatch()),
            Format::Double => value
                .as_float()
                .or_else(|_| value.as_int().map(|n| n as f64))
                .map(HostValue::Double)
                .map_err(|_| mismatch()),
        }
    }

    /// Delete a property.
    pub fn del_property(&self, name: &str) -> Result<(), ScriptError> {
        self.enter()?
            .del_property(name)
            .map_err(|code| self.host_error(code, name))
    }

    /// Observe a property under subscription `id`.
    pub fn observe_property(&self, name: &str, format: Format, id: u64) -> Result<(), ScriptError> {
        self.enter()?
            .observe_property(id, name, format)
            .map_err(|code| self.host_error(code, name))?;
        self.inner.state.borrow_mut().subscriptions.insert(
            id,
            Subscription {
                name: name.to_string(),
                format,
            },
        );
        Ok(())
    }

    /// Stop observing subscription `id`; returns how many observers went away.
    pub fn unobserve_property(&self, id: u64) -> Result<usize, ScriptError> {
        let removed = self
            .enter()?
            .unobserve_property(id)
            .map_err(|code| self.host_error(code, "unobserve"))?;
        self.inner.state.borrow_mut().subscriptions.remove(&id);
        Ok(removed)
    }

    /// Active subscriptions by id.
    pub fn subscriptions(&self) -> Vec<(u64, Subscription)> {
        self.inner
            .state
            .borrow()
            .subscriptions
            .iter()
            .map(|(id, sub)| (*id, sub.clone()))
            .collect()
    }

    /// Enable or disable an event by name.
    ///
    /// Names are matched against the event table; an unmatched name is
    /// neither success nor failure and does not reach the host.
    pub fn request_event(&self, name: &str, enable: bool) -> Result<RequestOutcome, ScriptError> {
        self.ensure_active()?;
        let Some(kind) = EventKind::from_name(name) else {
            return Ok(RequestOutcome::Unknown);
        };
        self.enter()?
            .request_event(kind, enable)
            .map_err(|code| self.host_error(code, name))?;
        Ok(RequestOutcome::Applied)
    }

    /// Subscribe to host log messages at `level`.
    pub fn enable_messages(&self, level: &str) -> Result<(), ScriptError> {
        self.enter()?
            .request_log_messages(level)
            .map_err(|code| match code {
                HostErrorCode::InvalidParameter => ScriptError::Host("Invalid log level".to_string()),
                other => self.host_error(other, level),
            })
    }

    /// Log `parts` joined by spaces. Nothing is written for an empty list.
    pub fn log(&self, level: LogLevel, parts: &[Dynamic]) -> Result<(), ScriptError> {
        self.ensure_active()?;
        if parts.is_empty() {
            return Ok(());
        }
        let message = parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.write_log(level, &message);
        Ok(())
    }

    /// Log with the level given by name.
    pub fn log_named(&self, level: &str, parts: &[Dynamic]) -> Result<(), ScriptError> {
        let level: LogLevel = level.parse()?;
        self.log(level, parts)
    }

    /// Write straight to the context's sink, baton or not.
    pub fn write_log(&self, level: LogLevel, message: &str) {
        self.inner.log.write(level, message);
    }

    /// Locate a file in the host's config directories.
    pub fn find_config_file(&self, name: &str) -> Result<PathBuf, ScriptError> {
        self.enter()?
            .find_config_file(name)
            .ok_or_else(|| ScriptError::NotFound(format!("config file '{}'", name)))
    }

    /// Define an input section.
    pub fn define_input_section(
        &self,
        name: &str,
        location: &str,
        contents: &str,
        builtin: bool,
        owner: &str,
    ) -> Result<(), ScriptError> {
        self.enter()?
            .define_input_section(name, location, contents, builtin, owner);
        self.inner.state.borrow_mut().sections.insert(
            name.to_string(),
            DefinedSection {
                location: location.to_string(),
                builtin,
                owner: owner.to_string(),
            },
        );
        Ok(())
    }

    /// Input sections defined by this context, by name.
    pub fn defined_sections(&self) -> Vec<(String, DefinedSection)> {
        self.inner
            .state
            .borrow()
            .sections
            .iter()
            .map(|(name, section)| (name.clone(), section.clone()))
            .collect()
    }

    /// Redefine every section this context defined with no bindings, so none
    /// of its keys resolve any more.
    pub fn clear_input_sections(&self) -> Result<(), ScriptError> {
        if self.inner.state.borrow().sections.is_empty() {
            return Ok(());
        }
        let client = self.enter()?;
        let sections = std::mem::take(&mut self.inner.state.borrow_mut().sections);
        for (name, section) in &sections {
            client.define_input_section(name, &section.location, "", section.builtin, &section.owner);
        }
        Ok(())
    }

    /// Enable an input section.
    pub fn enable_input_section(&self, name: &str, flags: InputFlags) -> Result<(), ScriptError> {
        self.enter()?.enable_input_section(name, flags);
        Ok(())
    }

    /// Show `text` on the OSD; the host default duration applies when
    /// `duration` is `None`.
    pub fn osd_message(&self, text: &str, duration: Option<&str>) -> Result<(), ScriptError> {
        let args = [
            "show-text".to_string(),
            text.to_string(),
            duration.unwrap_or("-1").to_string(),
        ];
        self.commandv(&args)
    }

    /// Register a key binding whose callback is the script function
    /// `callback`. Returns the binding name, generated when `name` is `None`.
    ///
    /// Bindings are sent to the host by [`ScriptApi::flush_bindings`].
    pub fn add_binding(
        &self,
        key: Option<&str>,
        name: Option<&str>,
        builtin: bool,
        callback: &str,
    ) -> Result<String, ScriptError> {
        self.ensure_active()?;
        if callback.is_empty() {
            return Err(ScriptError::Parse("binding callback name is empty".to_string()));
        }
        let mut state = self.inner.state.borrow_mut();
        state.next_binding += 1;
        let name = match name {
            Some(name) if name.contains(BINDING_SEPARATOR) => {
                return Err(ScriptError::Parse(format!(
                    "binding name '{}' may not contain '{}'",
                    name, BINDING_SEPARATOR
                )))
            }
            Some(name) => name.to_string(),
            None => format!("__keybinding{}", state.next_binding),
        };
        let input = key.map(|key| {
            format!(
                "{} script-binding {}{}{}",
                key, self.inner.name, BINDING_SEPARATOR, name
            )
        });
        state.bindings.insert(
            name.clone(),
            KeyBinding {
                input,
                builtin,
                callback: callback.to_string(),
            },
        );
        Ok(name)
    }

    /// Whether any key binding was registered.
    pub fn has_binding(&self) -> bool {
        !self.inner.state.borrow().bindings.is_empty()
    }

    /// Registered key bindings by name.
    pub fn bindings(&self) -> Vec<(String, KeyBinding)> {
        self.inner
            .state
            .borrow()
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.clone()))
            .collect()
    }

    /// Invoke `callback` when a client message starting with `name` arrives.
    pub fn register_script_message(&self, name: &str, callback: &str) -> Result<(), ScriptError> {
        self.ensure_active()?;
        if name.is_empty() || callback.is_empty() {
            return Err(ScriptError::Parse(
                "script message and callback names must not be empty".to_string(),
            ));
        }
        self.inner
            .state
            .borrow_mut()
            .script_messages
            .insert(name.to_string(), callback.to_string());
        Ok(())
    }

    /// Input section names for builtin and regular bindings.
    pub fn binding_sections(&self) -> (String, String) {
        (
            format!("script_{}_kbs_builtin", self.inner.name),
            format!("script_{}_kbs", self.inner.name),
        )
    }

    /// Send registered bindings to the host as up to two input sections,
    /// each enabled on top.
    pub fn flush_bindings(&self) -> Result<(), ScriptError> {
        let (builtin_section, regular_section) = self.binding_sections();
        let location = format!("script_{}_bs", self.inner.name);

        let (builtin, regular) = {
            let state = self.inner.state.borrow();
            let mut builtin = Vec::new();
            let mut regular = Vec::new();
            for binding in state.bindings.values() {
                if let Some(input) = &binding.input {
                    if binding.builtin {
                        builtin.push(input.clone());
                    } else {
                        regular.push(input.clone());
                    }
                }
            }
            (builtin, regular)
        };

        for (section, mut lines, is_builtin) in [
            (builtin_section, builtin, true),
            (regular_section, regular, false),
        ] {
            if lines.is_empty() {
                continue;
            }
            lines.sort();
            let contents = format!("\n{}", lines.join("\n"));
            self.define_input_section(&section, &location, &contents, is_builtin, &self.inner.name)?;
            self.enable_input_section(&section, InputFlags::ON_TOP)?;
        }
        Ok(())
    }

    /// Callbacks a client message should trigger in this context.
    ///
    /// A `key-binding` message addressed to `<client>___<name>` fires the
    /// binding on key release (third argument starting with `u`). A message
    /// whose first argument is a registered script-message name fires that
    /// callback with the remaining arguments.
    pub fn route_client_message(&self, args: &[String]) -> Vec<PendingCallback> {
        let state = self.inner.state.borrow();
        let mut pending = Vec::new();

        match args {
            [first, target, key_state, ..] if first == "key-binding" => {
                if let Some((client, name)) = target.split_once(BINDING_SEPARATOR) {
                    if client == self.inner.name && key_state.starts_with('u') {
                        if let Some(binding) = state.bindings.get(name) {
                            pending.push(PendingCallback {
                                function: binding.callback.clone(),
                                args: Vec::new(),
                            });
                        }
                    }
                }
            }
            [first, rest @ ..] => {
                if let Some(callback) = state.script_messages.get(first) {
                    let rest: rhai::Array = rest.iter().map(|arg| Dynamic::from(arg.clone())).collect();
                    pending.push(PendingCallback {
                        function: callback.clone(),
                        args: vec![Dynamic::from_array(rest)],
                    });
                }
            }
            [] => {}
        }
        pending
    }

    /// Value stored in the extension slot, `()` when absent.
    pub fn extension_get(&self, key: &str) -> Dynamic {
        self.inner
            .state
            .borrow()
            .extension
            .get(key)
            .cloned()
            .unwrap_or(Dynamic::UNIT)
    }

    /// Store a value in the extension slot.
    pub fn extension_set(&self, key: &str, value: Dynamic) {
        self.inner
            .state
            .borrow_mut()
            .extension
            .insert(key.into(), value);
    }

    /// Start collecting statistics; a no-op when already enabled.
    pub fn enable_stats(&self) {
        let mut state = self.inner.state.borrow_mut();
        if state.stats.is_none() {
            state.stats = Some(ContextStats::default());
        }
    }

    /// Statistics so far, if enabled.
    pub fn stats(&self) -> Option<ContextStats> {
        self.inner.state.borrow().stats
    }

    pub(crate) fn record_event(&self, elapsed: Duration) {
        if let Some(stats) = self.inner.state.borrow_mut().stats.as_mut() {
            stats.record_event(elapsed);
        }
    }
}
