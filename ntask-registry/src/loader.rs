//! Library loading seam.
//!
//! The registry never opens shared objects itself. A `LibraryLoader` turns a
//! path into a `PluginModule` whose entry point (exported as
//! [`PLUGIN_ENTRY_SYMBOL`]) registers classes through a `ClassRegistrar`.
//! Dropping the module releases whatever handle the loader holds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::library::ClassRegistrar;
use crate::RegistryError;

/// Symbol every plugin library exports as its registration entry point.
pub const PLUGIN_ENTRY_SYMBOL: &str = "ntask_register_library";

/// Entry point signature for modules linked into the executable.
pub type PluginEntry = fn(&mut ClassRegistrar<'_>);

/// A loaded plugin.
pub trait PluginModule: Send + Sync {
    /// Invokes the plugin entry point.
    fn register(&self, registrar: &mut ClassRegistrar<'_>) -> Result<(), RegistryError>;
}

/// Resolves a library path to a plugin module.
pub trait LibraryLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn PluginModule>, RegistryError>;
}

/// A module whose entry point is a plain function.
pub struct StaticModule {
    entry: PluginEntry,
}

impl StaticModule {
    pub fn new(entry: PluginEntry) -> Self {
        Self { entry }
    }
}

impl PluginModule for StaticModule {
    fn register(&self, registrar: &mut ClassRegistrar<'_>) -> Result<(), RegistryError> {
        (self.entry)(registrar);
        Ok(())
    }
}

/// Loader for plugins statically linked into the executable, keyed by the
/// path the host would have used for the shared object.
#[derive(Default)]
pub struct StaticLoader {
    entries: RwLock<HashMap<PathBuf, PluginEntry>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(self, path: impl Into<PathBuf>, entry: PluginEntry) -> Self {
        self.insert(path, entry);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, entry: PluginEntry) {
        self.entries.write().insert(path.into(), entry);
    }
}

impl LibraryLoader for StaticLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn PluginModule>, RegistryError> {
        let entry = self
            .entries
            .read()
            .get(path)
            .copied()
            .ok_or_else(|| RegistryError::ModuleNotFound {
                path: path.to_path_buf(),
                symbol: PLUGIN_ENTRY_SYMBOL,
            })?;
        Ok(Box::new(StaticModule::new(entry)))
    }
}
