//! The shared execution substrate and the baton.
//!
//! One [`Engine`] serves every context. Which context may run on it is
//! decided by the [`Baton`]: holding it marks that context's API handle as
//! active and routes `print`/`debug` output to the context's log sink.

use crate::client_api::ScriptApi;
use crate::config::ScriptingConfig;
use crate::register::register_client_api;
use host_types::{ContextId, LogLevel};
use rhai::Engine;
use std::cell::RefCell;
use std::rc::Rc;

type Holder = Rc<RefCell<Option<ScriptApi>>>;

/// The engine shared by all contexts.
pub struct Substrate {
    engine: Engine,
    holder: Holder,
}

impl Substrate {
    /// Engine with the `Client` API registered and output routing installed.
    pub fn new(config: &ScriptingConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_max_call_levels(config.max_call_levels);
        register_client_api(&mut engine);

        let holder: Holder = Rc::new(RefCell::new(None));

        let print_holder = Rc::clone(&holder);
        engine.on_print(move |text| route_output(&print_holder, LogLevel::Info, text));

        let debug_holder = Rc::clone(&holder);
        engine.on_debug(move |text, source, pos| {
            let message = match source {
                Some(source) if !pos.is_none() => format!("{} ({}, {})", text, source, pos),
                _ => text.to_string(),
            };
            route_output(&debug_holder, LogLevel::Debug, &message)
        });

        Self { engine, holder }
    }

    /// The shared engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Hand the baton to the context owning `api`.
    ///
    /// The previous holder, if any, gets the baton back when the returned
    /// guard is dropped.
    pub fn baton(&self, api: &ScriptApi) -> Baton<'_> {
        let previous = self.holder.borrow_mut().replace(api.clone());
        if let Some(previous) = &previous {
            previous.set_active(false);
        }
        api.set_active(true);
        Baton {
            substrate: self,
            api: api.clone(),
            previous,
        }
    }

    /// Context currently holding the baton.
    pub fn holder(&self) -> Option<ContextId> {
        self.holder.borrow().as_ref().map(ScriptApi::id)
    }
}

fn route_output(holder: &Holder, level: LogLevel, text: &str) {
    match holder.borrow().as_ref() {
        Some(api) => api.write_log(level, text),
        None => tracing::info!(target: "script", "{}", text),
    }
}

/// Execution ownership of the substrate for one context.
///
/// Host API calls of that context are valid only while this guard lives.
pub struct Baton<'a> {
    substrate: &'a Substrate,
    api: ScriptApi,
    previous: Option<ScriptApi>,
}

impl Baton<'_> {
    /// Context holding this baton.
    pub fn holder(&self) -> ContextId {
        self.api.id()
    }
}

impl Drop for Baton<'_> {
    fn drop(&mut self) {
        self.api.set_active(false);
        if let Some(previous) = &self.previous {
            previous.set_active(true);
        }
        *self.substrate.holder.borrow_mut() = self.previous.take();
    }
}
