//! JSON setup files for the headless host.

use crate::HeadlessHost;
use host_types::{EventKind, HostEvent, HostValue};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while reading a host setup
#[derive(Debug, Error)]
pub enum SetupError {
    /// The file could not be read
    #[error("failed to read host setup '{path}': {source}")]
    Io {
        /// Setup file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not a valid setup
    #[error("invalid host setup '{path}': {source}")]
    Json {
        /// Setup file
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// A scripted event queued before the dispatch loop starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventSpec {
    /// `script-message` style message
    ClientMessage {
        /// Message arguments
        args: Vec<String>,
    },
    /// Property change for subscription `id`
    PropertyChange {
        /// Subscription id
        id: u64,
        /// Property name
        name: String,
        /// New value
        #[serde(default)]
        value: JsonValue,
    },
    /// Shutdown request
    Shutdown,
    /// Any other event id, delivered without payload
    Other {
        /// Event id
        id: u32,
    },
}

impl EventSpec {
    /// The raw host event this spec stands for.
    pub fn to_event(&self) -> HostEvent {
        match self {
            EventSpec::ClientMessage { args } => HostEvent::client_message(args.as_slice()),
            EventSpec::PropertyChange { id, name, value } => {
                HostEvent::property_change(*id, name, HostValue::from(value))
            }
            EventSpec::Shutdown => HostEvent::shutdown(),
            EventSpec::Other { id } => HostEvent::new(EventKind::from_id(*id)),
        }
    }
}

/// Initial state of a [`HeadlessHost`].
///
/// ```json
/// {
///   "properties": { "media-title": "demo", "volume": 50.0 },
///   "config_dirs": ["/etc/player"],
///   "events": [{ "type": "client-message", "args": ["hello"] }],
///   "shutdown_when_idle": true
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostSetup {
    /// Properties added on top of the defaults
    pub properties: serde_json::Map<String, JsonValue>,
    /// Directories searched by `find_config_file`
    pub config_dirs: Vec<PathBuf>,
    /// Events queued in order
    pub events: Vec<EventSpec>,
    /// Deliver shutdown once the queue is empty
    pub shutdown_when_idle: bool,
}

impl HostSetup {
    /// Parse a setup from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SetupError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a host from this setup.
    pub fn build(&self) -> HeadlessHost {
        let host = HeadlessHost::new();
        for (name, value) in &self.properties {
            host.insert_property(name, HostValue::from(value));
        }
        for dir in &self.config_dirs {
            host.add_config_dir(dir.clone());
        }
        for event in &self.events {
            host.push_event(event.to_event());
        }
        host.set_shutdown_when_idle(self.shutdown_when_idle);
        host
    }
}
