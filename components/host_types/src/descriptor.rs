//! Script identity.

use std::fmt;
use std::path::{Path, PathBuf};

/// Permanent creation-order id of a context.
///
/// Assigned once when the context is created and never reused. It is not a
/// roster position: the roster is compacted after loading, ids are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u32);

impl ContextId {
    /// Id of the keep-alive context, created before any script.
    pub const KEEP_ALIVE: ContextId = ContextId(0);

    /// Id of the first script context.
    pub const FIRST_SCRIPT: ContextId = ContextId(1);
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A script to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    /// Source path: a script file, or a directory holding `main.<ext>`
    pub path: PathBuf,
    /// Display and client name
    pub name: String,
    /// Permanent creation-order id
    pub id: ContextId,
}

impl ScriptDescriptor {
    /// Descriptor for `path`, named after the file stem or directory name.
    ///
    /// # Examples
    ///
    /// ```
    /// use host_types::{ContextId, ScriptDescriptor};
    ///
    /// let d = ScriptDescriptor::new("/scripts/osc.rhai", ContextId(3));
    /// assert_eq!(d.name, "osc");
    /// ```
    pub fn new(path: impl Into<PathBuf>, id: ContextId) -> Self {
        let path = path.into();
        let name = script_name(&path);
        Self { path, name, id }
    }

    /// Descriptors for `paths`, ids assigned in order from
    /// [`ContextId::FIRST_SCRIPT`].
    pub fn for_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<ScriptDescriptor> {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                ScriptDescriptor::new(p.as_ref(), ContextId(ContextId::FIRST_SCRIPT.0 + i as u32))
            })
            .collect()
    }
}

impl fmt::Display for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.id, self.name, self.path.display())
    }
}

fn script_name(path: &Path) -> String {
    let stem = if path.extension().is_some() {
        path.file_stem()
    } else {
        path.file_name()
    };
    stem.map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "script".to_string())
}
