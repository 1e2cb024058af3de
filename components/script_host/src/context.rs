//! Execution contexts.
//!
//! A context owns everything one script needs: its own [`Scope`] and
//! compiled [`AST`] (the isolated state), the API handle bound to its host
//! client, and a lifecycle state. Values created during a call live in the
//! scope or in owned temporaries of that call and are released when the call
//! returns, whatever the exit path.

use crate::client_api::ScriptApi;
use crate::lifecycle::RosterSlot;
use crate::substrate::Substrate;
use host_types::{ContextId, EnvelopePayload, EventEnvelope, LogLevel, ScriptDescriptor};
use rhai::{CallFnOptions, Dynamic, EvalAltResult, Scope, AST};
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use value_bridge::NativeEvent;

/// Name of the required event hook.
pub const PROCESS_EVENT_HOOK: &str = "process_event";
/// Name of the optional startup hook.
pub const FLUSH_HOOK: &str = "flush";

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, nothing loaded yet
    Created,
    /// Script is being compiled and executed
    Initializing,
    /// Loaded and part of the roster
    Running,
    /// Failed to load and was thrown away
    Discarded,
    /// Torn down after running
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Running => "running",
            LifecycleState::Discarded => "discarded",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A script function failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{function} failed: {message}")]
pub struct HookError {
    /// Function that was called
    pub function: String,
    /// Error text
    pub message: String,
}

impl HookError {
    fn new(function: &str, err: Box<EvalAltResult>) -> Self {
        Self {
            function: function.to_string(),
            message: describe(&err),
        }
    }
}

/// Text of a script error; thrown `#{ kind, message }` maps read as
/// `kind: message`.
pub(crate) fn describe(err: &EvalAltResult) -> String {
    if let EvalAltResult::ErrorRuntime(value, pos) = err {
        if let Some(map) = value.read_lock::<rhai::Map>() {
            if let (Some(kind), Some(message)) = (map.get("kind"), map.get("message")) {
                return if pos.is_none() {
                    format!("{}: {}", kind, message)
                } else {
                    format!("{}: {} ({})", kind, message, pos)
                };
            }
        }
    }
    err.to_string()
}

/// One isolated script environment.
pub struct ExecutionContext {
    descriptor: ScriptDescriptor,
    state: LifecycleState,
    api: ScriptApi,
    this: Dynamic,
    scope: Scope<'static>,
    ast: AST,
    roster_slot: Option<RosterSlot>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("descriptor", &self.descriptor)
            .field("state", &self.state)
            .field("roster_slot", &self.roster_slot)
            .finish()
    }
}

impl ExecutionContext {
    /// Fresh context bound to `api`.
    pub fn new(descriptor: ScriptDescriptor, api: ScriptApi) -> Self {
        let this = Dynamic::from(api.clone());
        Self {
            descriptor,
            state: LifecycleState::Created,
            api,
            this,
            scope: Scope::new(),
            ast: AST::empty(),
            roster_slot: None,
        }
    }

    /// What was loaded into this context.
    pub fn descriptor(&self) -> &ScriptDescriptor {
        &self.descriptor
    }

    /// Permanent id.
    pub fn id(&self) -> ContextId {
        self.descriptor.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// The host API handle of this context.
    pub fn api(&self) -> &ScriptApi {
        &self.api
    }

    /// Roster position, once the roster is built.
    pub fn roster_slot(&self) -> Option<RosterSlot> {
        self.roster_slot
    }

    pub(crate) fn set_roster_slot(&mut self, slot: RosterSlot) {
        self.roster_slot = Some(slot);
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Scope<'static> {
        &mut self.scope
    }

    pub(crate) fn install(&mut self, ast: AST) {
        self.ast = ast;
    }

    /// Whether the script defines `name` taking `arity` parameters.
    pub fn has_function(&self, name: &str, arity: usize) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == name && f.params.len() == arity)
    }

    /// Call a script function with `this` bound to the context's API.
    ///
    /// The caller must hold the baton for this context.
    fn call(&mut self, substrate: &Substrate, function: &str, args: Vec<Dynamic>) -> Result<Dynamic, HookError> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.this);
        substrate
            .engine()
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, function, args)
            .map_err(|err| HookError::new(function, err))
    }

    /// Run the `flush` hook, if the script has one, after sending key
    /// bindings to the host.
    pub fn flush(&mut self, substrate: &Substrate) -> Result<(), HookError> {
        let _baton = substrate.baton(&self.api);
        self.api.flush_bindings().map_err(|err| HookError {
            function: FLUSH_HOOK.to_string(),
            message: err.to_string(),
        })?;
        if self.has_function(FLUSH_HOOK, 0) {
            self.call(substrate, FLUSH_HOOK, Vec::new())?;
        }
        Ok(())
    }

    /// Deliver one event.
    ///
    /// Client messages first fire any matching binding or script-message
    /// callbacks; a failing callback is logged and does not keep the event
    /// from reaching `process_event`.
    pub fn deliver(
        &mut self,
        substrate: &Substrate,
        envelope: &EventEnvelope,
        event: &NativeEvent,
    ) -> Result<(), HookError> {
        let started = Instant::now();
        let _baton = substrate.baton(&self.api);

        if let EnvelopePayload::ClientMessage(message) = &envelope.payload {
            for callback in self.api.route_client_message(&message.args) {
                if let Err(err) = self.call(substrate, &callback.function, callback.args) {
                    self.api.write_log(LogLevel::Error, &err.to_string());
                    tracing::error!(
                        id = %self.descriptor.id,
                        script = %self.descriptor.name,
                        path = %self.descriptor.path.display(),
                        error = %err,
                        "callback failed"
                    );
                }
            }
        }

        let result = self.call(
            substrate,
            PROCESS_EVENT_HOOK,
            vec![Dynamic::from(event.kind.clone()), event.payload.clone()],
        );
        self.api.record_event(started.elapsed());
        result.map(|_| ())
    }
}
