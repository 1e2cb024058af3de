//! Script loading: resolve, read, compile, run, verify.

use crate::context::{describe, ExecutionContext, LifecycleState, PROCESS_EVENT_HOOK};
use crate::substrate::Substrate;
use host_types::{ContextId, HostErrorCode};
use rhai::Dynamic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global variable holding the context's API object.
pub const API_VARIABLE: &str = "mp";
/// Global variable holding the client name.
pub const CLIENT_NAME_VARIABLE: &str = "client_name";

/// Why a script could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    /// No script at the given path
    #[error("script not found: {path}")]
    NotFound {
        /// Resolved path
        path: PathBuf,
    },
    /// The script could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The script does not compile
    #[error("failed to compile {path}: {message}")]
    Compile {
        /// Resolved path
        path: PathBuf,
        /// Compiler message
        message: String,
    },
    /// Top-level code raised an error
    #[error("failed to run {path}: {message}")]
    Execute {
        /// Resolved path
        path: PathBuf,
        /// Error text
        message: String,
    },
    /// The script defines no `process_event(kind, payload)` hook
    #[error("{path} does not define fn {hook}(kind, payload)")]
    MissingBinding {
        /// Resolved path
        path: PathBuf,
        /// Required hook name
        hook: &'static str,
    },
    /// The host refused to create a client
    #[error("host refused a client for '{name}': {code:?}")]
    Client {
        /// Requested client name
        name: String,
        /// Host status
        code: HostErrorCode,
    },
}

/// A script that was attempted and discarded.
#[derive(Debug)]
pub struct LoadFailure {
    /// Id the script was created with
    pub id: ContextId,
    /// Script name
    pub name: String,
    /// Script path
    pub path: PathBuf,
    /// Cause
    pub error: LoadError,
}

/// Loads script sources into contexts.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    extension: String,
}

impl ScriptLoader {
    /// Loader for scripts with the given file extension.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Path of the source file for `path`: the file itself, or
    /// `main.<ext>` inside a directory.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, LoadError> {
        let resolved = if path.is_dir() {
            path.join(format!("main.{}", self.extension))
        } else {
            path.to_path_buf()
        };
        if resolved.is_file() {
            Ok(resolved)
        } else {
            Err(LoadError::NotFound { path: resolved })
        }
    }

    /// Populate `context` from its descriptor.
    ///
    /// On success the context is left in [`LifecycleState::Initializing`];
    /// it becomes `Running` once it is placed in the roster.
    pub fn load(&self, context: &mut ExecutionContext, substrate: &Substrate) -> Result<(), LoadError> {
        context.set_state(LifecycleState::Initializing);

        let path = self.resolve(&context.descriptor().path)?;
        let source = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;

        let mut ast = substrate
            .engine()
            .compile(&source)
            .map_err(|err| LoadError::Compile {
                path: path.clone(),
                message: err.to_string(),
            })?;
        ast.set_source(path.display().to_string());

        let api = context.api().clone();
        let client_name = api.name().to_string();
        let scope = context.scope_mut();
        scope.push(API_VARIABLE, api.clone());
        scope.push_constant(CLIENT_NAME_VARIABLE, Dynamic::from(client_name));

        {
            let _baton = substrate.baton(&api);
            substrate
                .engine()
                .run_ast_with_scope(context.scope_mut(), &ast)
                .map_err(|err| LoadError::Execute {
                    path: path.clone(),
                    message: describe(&err),
                })?;
        }

        context.install(ast);
        if !context.has_function(PROCESS_EVENT_HOOK, 2) {
            return Err(LoadError::MissingBinding {
                path,
                hook: PROCESS_EVENT_HOOK,
            });
        }

        tracing::debug!(
            id = %context.id(),
            script = %context.name(),
            path = %path.display(),
            "script loaded"
        );
        Ok(())
    }
}

/// Scripts in `dir`, in name order: files with the given extension and
/// directories holding `main.<ext>`.
pub fn discover_scripts(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let main = format!("main.{}", extension);
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_script = if path.is_dir() {
            path.join(&main).is_file()
        } else {
            path.extension().and_then(|e| e.to_str()) == Some(extension)
        };
        if is_script {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
