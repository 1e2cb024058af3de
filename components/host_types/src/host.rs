//! Collaborator surface consumed from the host.
//!
//! The scripting subsystem never reaches into the host's command engine,
//! property store or event source directly; it only talks to these traits.
//! Everything runs on the coordinator's thread, so handles are shared with
//! `Rc` rather than `Arc`.

use crate::{EventKind, Format, HostEvent, HostResult, HostValue, InputFlags};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// The embedding engine.
pub trait Host {
    /// Create a client handle. The host may adjust `name` to keep it unique.
    fn create_client(&self, name: &str) -> HostResult<Rc<dyn HostClient>>;

    /// Block for up to `timeout` waiting for the next event.
    ///
    /// Returns an [`EventKind::None`] event when the timeout expires.
    fn wait_event(&self, timeout: Duration) -> HostEvent;

    /// Told when scripting failed to load altogether; the host continues
    /// without an active scripting client.
    fn notify_no_active_client(&self);
}

/// A client handle bound to exactly one script context.
pub trait HostClient {
    /// Name the host registered this client under.
    fn client_name(&self) -> String;

    /// Message text for an error code.
    fn error_string(&self, code: crate::HostErrorCode) -> String {
        code.default_message().to_string()
    }

    /// Enable or disable delivery of an event kind.
    fn request_event(&self, kind: EventKind, enable: bool) -> HostResult<()>;

    /// Subscribe to host log messages at `level` (`"no"` to unsubscribe).
    fn request_log_messages(&self, level: &str) -> HostResult<()>;

    /// Run a command given as separate arguments.
    fn command(&self, args: &[&str]) -> HostResult<()>;

    /// Run a command given as a single string to be parsed by the host.
    fn command_string(&self, command: &str) -> HostResult<()>;

    /// Run a command given as a value tree and return its result.
    fn command_node(&self, node: &HostValue) -> HostResult<HostValue>;

    /// Read a property in the requested format.
    fn get_property(&self, name: &str, format: Format) -> HostResult<HostValue>;

    /// Write a property in the given format.
    fn set_property(&self, name: &str, format: Format, value: &HostValue) -> HostResult<()>;

    /// Delete a property.
    fn del_property(&self, name: &str) -> HostResult<()>;

    /// Start observing a property; changes arrive as property-change events
    /// with `reply_userdata == id`.
    fn observe_property(&self, id: u64, name: &str, format: Format) -> HostResult<()>;

    /// Stop observing every property registered under `id`.
    /// Returns the number of removed observers.
    fn unobserve_property(&self, id: u64) -> HostResult<usize>;

    /// Look up a file in the host's config directories.
    fn find_config_file(&self, name: &str) -> Option<PathBuf>;

    /// Define an input section with key bindings in input.conf syntax.
    fn define_input_section(
        &self,
        name: &str,
        location: &str,
        contents: &str,
        builtin: bool,
        owner: &str,
    );

    /// Enable a previously defined input section.
    fn enable_input_section(&self, name: &str, flags: InputFlags);
}
