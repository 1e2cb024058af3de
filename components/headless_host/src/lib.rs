//! In-memory host for the scripting subsystem
//!
//! This crate provides a host that implements the collaborator traits of
//! `host_types` without any media machinery behind them. It backs the CLI
//! and every test in the workspace.
//!
//! # Overview
//!
//! - [`HeadlessHost`] - Property store, event queue and client registry
//! - [`HeadlessClient`] - Client handle; every call is counted
//! - [`EventInjector`] - Thread-safe handle for pushing events
//! - [`HostSetup`] - JSON description of an initial host state
//!
//! The event queue sits behind a `parking_lot` mutex and condition variable,
//! so a feeder thread can push events while the coordinator blocks in
//! `wait_event`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod client;
mod commands;
mod host;
mod properties;
mod setup;

pub use client::HeadlessClient;
pub use host::{CommandRecord, EventInjector, HeadlessHost, InputSection};
pub use setup::{EventSpec, HostSetup, SetupError};
