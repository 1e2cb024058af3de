//! Event dispatch.
//!
//! The loop pulls one event at a time from the host, marshals it once and
//! hands it to every live context in roster order. Each turn:
//! 1. Waits for the next host event (bounded by the configured timeout)
//! 2. Skips timeouts, stops on shutdown
//! 3. Delivers everything else to each context, isolating failures

use crate::context::{ExecutionContext, HookError};
use crate::lifecycle::{LifecycleManager, Roster};
use host_types::{EventEnvelope, EventKind, HostEvent, LogLevel};

/// Counters of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events delivered to the roster
    pub events: u64,
    /// Successful `process_event` calls
    pub deliveries: u64,
    /// Failed `process_event` calls
    pub failures: u64,
    /// Timeouts without an event
    pub idle_polls: u64,
    /// Events that could not be marshalled
    pub dropped: u64,
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Nothing to deliver
    Idle,
    /// Delivered to the roster
    Delivered,
    /// Could not be marshalled
    Dropped,
    /// The host is shutting down
    Shutdown,
}

/// Delivers host events to a roster.
pub struct EventLoop<'a> {
    manager: &'a LifecycleManager,
    roster: &'a mut Roster,
    report: DispatchReport,
}

impl<'a> EventLoop<'a> {
    /// Loop over `roster`, using the host and substrate of `manager`.
    pub fn new(manager: &'a LifecycleManager, roster: &'a mut Roster) -> Self {
        Self {
            manager,
            roster,
            report: DispatchReport::default(),
        }
    }

    /// Counters so far.
    pub fn report(&self) -> DispatchReport {
        self.report
    }

    /// Run until the host sends shutdown.
    pub fn run(mut self) -> DispatchReport {
        let timeout = self.manager.config().wait_timeout();
        loop {
            let event = self.manager.host().wait_event(timeout);
            if self.dispatch(&event) == Dispatched::Shutdown {
                break;
            }
        }
        tracing::debug!(
            events = self.report.events,
            failures = self.report.failures,
            "event loop stopped"
        );
        self.report
    }

    /// Deliver a single event to every context in roster order.
    ///
    /// A context whose handler fails is logged and skipped for this event
    /// only; the remaining contexts still receive it.
    pub fn dispatch(&mut self, event: &HostEvent) -> Dispatched {
        match event.kind {
            EventKind::None => {
                self.report.idle_polls += 1;
                return Dispatched::Idle;
            }
            EventKind::Shutdown => return Dispatched::Shutdown,
            _ => {}
        }

        let envelope = EventEnvelope::from_event(event);
        let native = match self.manager.bridge().marshal_envelope(&envelope) {
            Ok(native) => native,
            Err(err) => {
                tracing::warn!(kind = ?event.kind, error = %err, "event dropped");
                self.report.dropped += 1;
                return Dispatched::Dropped;
            }
        };

        self.report.events += 1;
        for context in self.roster.iter_mut() {
            match context.deliver(self.manager.substrate(), &envelope, &native) {
                Ok(()) => self.report.deliveries += 1,
                Err(err) => {
                    self.report.failures += 1;
                    log_failure(context, &err);
                }
            }
        }
        Dispatched::Delivered
    }
}

fn log_failure(context: &ExecutionContext, err: &HookError) {
    context.api().write_log(LogLevel::Error, &err.to_string());
    tracing::error!(
        id = %context.id(),
        script = %context.name(),
        path = %context.descriptor().path.display(),
        error = %err,
        "event handler failed"
    );
}
