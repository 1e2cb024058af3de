//! Value marshalling bridge.
//!
//! Converts between the host's tagged [`host_types::HostValue`] and the
//! script engine's native [`rhai::Dynamic`], in both directions, with a
//! configurable nesting limit. Also turns marshalled event envelopes into
//! the arguments of a script's `process_event` hook.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod bridge;
mod envelope;

pub use bridge::{Bridge, BridgeOptions, MarshalError, DEFAULT_MAX_DEPTH};
pub use envelope::NativeEvent;
