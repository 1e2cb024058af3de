//! Multi-context script hosting
//!
//! Loads several independent scripts into isolated execution contexts on a
//! single shared Rhai engine, binds each to its own host client and
//! broadcasts host events to all of them.
//!
//! # Overview
//!
//! - [`LifecycleManager`] - Creates, loads and tears down contexts
//! - [`ExecutionContext`] - One script's scope, compiled code and API handle
//! - [`Substrate`] - The shared engine and the [`Baton`] guarding it
//! - [`ScriptApi`] - Host API surface exposed to scripts as `mp`
//! - [`EventLoop`] - Delivers host events to the roster
//! - [`ScriptingSubsystem`] - Load, start, dispatch, shut down
//!
//! A script is usable once it defines `fn process_event(kind, payload)`.
//! Inside hooks the API is reachable through `this`:
//!
//! ```text
//! mp.observe_property("pause", "flag", 1);
//!
//! fn process_event(kind, payload) {
//!     if kind == "property-change" {
//!         this.info("pause is now", payload.value);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod client_api;
mod config;
mod context;
mod dispatch;
mod lifecycle;
mod loader;
mod log;
mod register;
mod stats;
mod substrate;
mod subsystem;

pub use client_api::{
    DefinedSection, KeyBinding, PendingCallback, RequestOutcome, ScriptApi, Subscription, BINDING_SEPARATOR,
};
pub use config::{ConfigError, ScriptingConfig};
pub use context::{ExecutionContext, HookError, LifecycleState, FLUSH_HOOK, PROCESS_EVENT_HOOK};
pub use dispatch::{DispatchReport, Dispatched, EventLoop};
pub use lifecycle::{
    ContextRegistry, LifecycleManager, LoadReport, RegistryEntry, Roster, RosterSlot,
    SubsystemError, KEEP_ALIVE_NAME,
};
pub use loader::{
    discover_scripts, LoadError, LoadFailure, ScriptLoader, API_VARIABLE, CLIENT_NAME_VARIABLE,
};
pub use log::{CaptureSink, LogSink, TracingSink};
pub use register::{register_client_api, throw};
pub use stats::ContextStats;
pub use substrate::{Baton, Substrate};
pub use subsystem::ScriptingSubsystem;
