//! Context lifecycle: creation, loading, roster building and teardown.

use crate::client_api::ScriptApi;
use crate::config::{ConfigError, ScriptingConfig};
use crate::context::{ExecutionContext, LifecycleState};
use crate::loader::{LoadError, LoadFailure, ScriptLoader};
use crate::log::{LogSink, TracingSink};
use crate::substrate::Substrate;
use host_types::{ContextId, Host, HostErrorCode, ScriptDescriptor};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use value_bridge::Bridge;

/// Client name of the keep-alive context.
pub const KEEP_ALIVE_NAME: &str = "keep-alive";

/// Failure of the scripting subsystem as a whole
#[derive(Debug, Error)]
pub enum SubsystemError {
    /// Not a single script survived loading
    #[error("no script loaded successfully ({} failed)", .failures.len())]
    NoActiveClient {
        /// Every discarded script
        failures: Vec<LoadFailure>,
        /// The manager, still holding the keep-alive context
        manager: Box<LifecycleManager>,
    },
    /// The host refused the keep-alive client
    #[error("failed to create the keep-alive client: {0:?}")]
    KeepAlive(HostErrorCode),
    /// The configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Position of a live context in the roster.
///
/// Dense and zero-based; unrelated to the context's permanent [`ContextId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RosterSlot(pub usize);

impl fmt::Display for RosterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// The live contexts, in delivery order.
///
/// Built once after every load attempt; no context is added or removed
/// until teardown.
#[derive(Debug, Default)]
pub struct Roster {
    contexts: Vec<ExecutionContext>,
}

impl Roster {
    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no context survived.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Context at `slot`.
    pub fn get(&self, slot: RosterSlot) -> Option<&ExecutionContext> {
        self.contexts.get(slot.0)
    }

    /// Contexts in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.contexts.iter()
    }

    /// Permanent ids in roster order.
    pub fn ids(&self) -> Vec<ContextId> {
        self.contexts.iter().map(ExecutionContext::id).collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ExecutionContext> {
        self.contexts.iter_mut()
    }

    fn into_contexts(self) -> Vec<ExecutionContext> {
        self.contexts
    }
}

/// Where a live context can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Permanent id
    pub id: ContextId,
    /// Roster position
    pub slot: RosterSlot,
}

/// Live contexts by client name.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl ContextRegistry {
    /// Entry for the context registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<RegistryEntry> {
        self.entries.get(name).copied()
    }

    /// Number of registered contexts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register(&mut self, name: &str, entry: RegistryEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Result of loading a set of scripts.
#[derive(Debug)]
pub struct LoadReport {
    /// Contexts that loaded, compacted
    pub roster: Roster,
    /// Contexts that were discarded
    pub failures: Vec<LoadFailure>,
}

type SinkFactory = Box<dyn Fn(&ScriptDescriptor) -> Rc<dyn LogSink>>;

/// Owns the substrate, the registry and the keep-alive context.
///
/// Dropping the manager without calling [`LifecycleManager::shutdown`]
/// releases its host clients but skips the teardown logging.
pub struct LifecycleManager {
    host: Rc<dyn Host>,
    substrate: Substrate,
    config: ScriptingConfig,
    bridge: Bridge,
    loader: ScriptLoader,
    registry: ContextRegistry,
    keep_alive: Option<ExecutionContext>,
    sink_factory: SinkFactory,
}

impl fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("keep_alive", &self.keep_alive.as_ref().map(ExecutionContext::id))
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Set up the substrate and the keep-alive context.
    ///
    /// The keep-alive context holds a client of its own and stays alive
    /// until [`LifecycleManager::shutdown`], even if every script fails.
    pub fn new(host: Rc<dyn Host>, config: ScriptingConfig) -> Result<Self, SubsystemError> {
        config.validate()?;
        let substrate = Substrate::new(&config);
        let bridge = Bridge::with_max_depth(config.max_value_depth);

        let client = host
            .create_client(KEEP_ALIVE_NAME)
            .map_err(SubsystemError::KeepAlive)?;
        let descriptor = ScriptDescriptor {
            path: PathBuf::new(),
            name: KEEP_ALIVE_NAME.to_string(),
            id: ContextId::KEEP_ALIVE,
        };
        let api = ScriptApi::new(
            ContextId::KEEP_ALIVE,
            client,
            Rc::new(TracingSink::new(KEEP_ALIVE_NAME)),
            bridge,
        );
        let mut keep_alive = ExecutionContext::new(descriptor, api);
        keep_alive.set_state(LifecycleState::Running);

        Ok(Self {
            host,
            substrate,
            loader: ScriptLoader::new(config.script_extension.clone()),
            config,
            bridge,
            registry: ContextRegistry::default(),
            keep_alive: Some(keep_alive),
            sink_factory: Box::new(|descriptor: &ScriptDescriptor| -> Rc<dyn LogSink> {
                Rc::new(TracingSink::new(descriptor.name.clone()))
            }),
        })
    }

    /// Use `factory` to create each script's log sink.
    pub fn with_sink_factory(
        mut self,
        factory: impl Fn(&ScriptDescriptor) -> Rc<dyn LogSink> + 'static,
    ) -> Self {
        self.sink_factory = Box::new(factory);
        self
    }

    /// The host.
    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    /// The shared substrate.
    pub fn substrate(&self) -> &Substrate {
        &self.substrate
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ScriptingConfig {
        &self.config
    }

    /// Marshalling bridge shared by all contexts.
    pub fn bridge(&self) -> Bridge {
        self.bridge
    }

    /// Live contexts by name.
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// The keep-alive context, until shutdown.
    pub fn keep_alive(&self) -> Option<&ExecutionContext> {
        self.keep_alive.as_ref()
    }

    /// Create a context for `descriptor` with its own host client.
    pub fn create(&self, descriptor: &ScriptDescriptor) -> Result<ExecutionContext, LoadError> {
        let client = self
            .host
            .create_client(&descriptor.name)
            .map_err(|code| LoadError::Client {
                name: descriptor.name.clone(),
                code,
            })?;
        let api = ScriptApi::new(
            descriptor.id,
            client,
            (self.sink_factory)(descriptor),
            self.bridge,
        );
        if self.config.stats {
            api.enable_stats();
        }
        Ok(ExecutionContext::new(descriptor.clone(), api))
    }

    /// Compile and run the script of `context`.
    pub fn load(&self, context: &mut ExecutionContext) -> Result<(), LoadError> {
        self.loader.load(context, &self.substrate)
    }

    /// Tear a context down and return the state it ended in.
    ///
    /// Observers and input sections the script registered with the host are
    /// released whatever state the context is in. Running contexts end
    /// `Terminated`; anything else ends `Discarded`.
    pub fn destroy(&self, mut context: ExecutionContext) -> LifecycleState {
        let final_state = if context.state() == LifecycleState::Running {
            LifecycleState::Terminated
        } else {
            LifecycleState::Discarded
        };

        let api = context.api().clone();
        {
            let _baton = self.substrate.baton(&api);
            for (id, subscription) in api.subscriptions() {
                if let Err(err) = api.unobserve_property(id) {
                    tracing::warn!(
                        id = %context.id(),
                        script = %context.name(),
                        property = %subscription.name,
                        error = %err,
                        "failed to drop subscription"
                    );
                }
            }
            if let Err(err) = api.clear_input_sections() {
                tracing::warn!(
                    id = %context.id(),
                    script = %context.name(),
                    error = %err,
                    "failed to clear input sections"
                );
            }
        }

        if let Some(stats) = context.api().stats() {
            tracing::info!(
                id = %context.id(),
                script = %context.name(),
                events = stats.events,
                host_calls = stats.host_calls,
                busy_ms = stats.busy.as_secs_f64() * 1000.0,
                "context statistics"
            );
        }

        context.set_state(final_state);
        tracing::debug!(id = %context.id(), script = %context.name(), state = %final_state, "context destroyed");
        final_state
    }

    fn discard(&self, context: ExecutionContext, error: LoadError) -> LoadFailure {
        tracing::error!(
            id = %context.id(),
            script = %context.name(),
            path = %context.descriptor().path.display(),
            error = %error,
            "script discarded"
        );
        let failure = LoadFailure {
            id: context.id(),
            name: context.name().to_string(),
            path: context.descriptor().path.clone(),
            error,
        };
        self.destroy(context);
        failure
    }

    /// Compact the loaded contexts into the roster, in the given order, and
    /// register each under its client name.
    pub fn build_roster(&mut self, contexts: Vec<ExecutionContext>) -> Roster {
        self.registry.clear();
        let mut roster = Roster {
            contexts: Vec::with_capacity(contexts.len()),
        };
        for (index, mut context) in contexts.into_iter().enumerate() {
            let slot = RosterSlot(index);
            context.set_roster_slot(slot);
            context.set_state(LifecycleState::Running);
            self.registry.register(
                context.api().name(),
                RegistryEntry {
                    id: context.id(),
                    slot,
                },
            );
            roster.contexts.push(context);
        }
        roster
    }

    /// Attempt every descriptor, discard failures, then build the roster.
    ///
    /// One script failing never stops the others from loading.
    pub fn load_all(&mut self, descriptors: &[ScriptDescriptor]) -> LoadReport {
        let mut loaded = Vec::new();
        let mut failures = Vec::new();

        for descriptor in descriptors {
            match self.create(descriptor) {
                Ok(mut context) => match self.load(&mut context) {
                    Ok(()) => loaded.push(context),
                    Err(error) => failures.push(self.discard(context, error)),
                },
                Err(error) => {
                    tracing::error!(
                        id = %descriptor.id,
                        script = %descriptor.name,
                        path = %descriptor.path.display(),
                        error = %error,
                        "script discarded"
                    );
                    failures.push(LoadFailure {
                        id: descriptor.id,
                        name: descriptor.name.clone(),
                        path: descriptor.path.clone(),
                        error,
                    });
                }
            }
        }

        let roster = self.build_roster(loaded);
        tracing::info!(loaded = roster.len(), failed = failures.len(), "scripts loaded");
        LoadReport { roster, failures }
    }

    /// Send key bindings and run every context's `flush` hook.
    pub fn start(&self, roster: &mut Roster) {
        for context in roster.iter_mut() {
            if let Err(err) = context.flush(&self.substrate) {
                tracing::error!(
                    id = %context.id(),
                    script = %context.name(),
                    error = %err,
                    "flush failed"
                );
            }
        }
    }

    /// Destroy every context in `roster`, then the keep-alive context.
    pub fn shutdown(&mut self, roster: Roster) {
        for context in roster.into_contexts() {
            self.destroy(context);
        }
        self.registry.clear();
        if let Some(keep_alive) = self.keep_alive.take() {
            self.destroy(keep_alive);
        }
    }
}
