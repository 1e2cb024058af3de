//! Host-side types for the scripting subsystem.
//!
//! This crate provides the vocabulary shared between the host and the
//! script contexts it runs: the generic value type, the event table,
//! property formats, the error taxonomy and the host collaborator traits.
//!
//! # Overview
//!
//! - [`HostValue`] - Tagged generic value exchanged with the host
//! - [`HostEvent`] / [`EventEnvelope`] - Raw and marshalled events
//! - [`EventKind`] - Event kinds and the fixed name table
//! - [`ScriptError`] - Failures of individual Host API calls
//! - [`Host`] / [`HostClient`] - The host collaborator surface
//! - [`ScriptDescriptor`] - Identity of a script to load
//!
//! # Examples
//!
//! ```
//! use host_types::{EventKind, HostEvent, EventEnvelope, EnvelopePayload};
//!
//! let event = HostEvent::client_message(&["key-binding", "osc___toggle", "u-"]);
//! let envelope = EventEnvelope::from_event(&event);
//! assert_eq!(envelope.kind, EventKind::ClientMessage);
//! assert!(matches!(envelope.payload, EnvelopePayload::ClientMessage(_)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod descriptor;
mod error;
mod event;
mod format;
mod host;
mod value;

pub use descriptor::{ContextId, ScriptDescriptor};
pub use error::{HostErrorCode, HostResult, ScriptError};
pub use event::{
    event_name, ClientMessage, EnvelopePayload, EventData, EventEnvelope, EventKind, HostEvent,
    EVENT_TABLE_LEN,
};
pub use format::{Format, InputFlags, LogLevel};
pub use host::{Host, HostClient};
pub use value::HostValue;

/// Largest argument count accepted by a vector command. The host's argument
/// array holds one more slot for the terminator.
pub const MAX_COMMAND_ARGS: usize = 49;
