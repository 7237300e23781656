//! Loaded plugin libraries and the registration callback surface.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use ntask_core::compare::ComparatorFn;
use ntask_core::ObjectKind;

use crate::loader::PluginModule;
use crate::object::ObjectCreator;
use crate::RegistryError;

/// Free function exported by a library under a symbol name.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub enum NativeFunction {
    Comparator(ComparatorFn),
}

impl NativeFunction {
    pub fn as_comparator(&self) -> Option<ComparatorFn> {
        match self {
            NativeFunction::Comparator(cmp) => Some(*cmp),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeFunction::Comparator(_) => f.write_str("Comparator"),
        }
    }
}

/// Handed to a plugin's entry point while its library is being loaded.
///
/// Registering a class name twice keeps the later creator.
pub struct ClassRegistrar<'a> {
    classes: &'a mut HashMap<String, ObjectCreator>,
    functions: &'a mut HashMap<String, NativeFunction>,
    defaults: &'a mut HashMap<ObjectKind, String>,
}

impl ClassRegistrar<'_> {
    pub fn register_class(&mut self, name: impl Into<String>, creator: ObjectCreator) {
        self.classes.insert(name.into(), creator);
    }

    pub fn register_function(&mut self, name: impl Into<String>, function: NativeFunction) {
        self.functions.insert(name.into(), function);
    }

    /// Claims the default implementation of `kind` for this library.
    pub fn set_default_class(&mut self, kind: ObjectKind, name: impl Into<String>) {
        self.defaults.insert(kind, name.into());
    }
}

/// A plugin module together with everything it registered.
///
/// Dropping a library drops its module handle.
pub struct Library {
    name: String,
    path: PathBuf,
    classes: HashMap<String, ObjectCreator>,
    functions: HashMap<String, NativeFunction>,
    defaults: HashMap<ObjectKind, String>,
    _module: Box<dyn PluginModule>,
}

impl Library {
    /// Runs the module's entry point and captures its registrations.
    pub fn load(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        module: Box<dyn PluginModule>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let mut classes = HashMap::new();
        let mut functions = HashMap::new();
        let mut defaults = HashMap::new();
        {
            let mut registrar = ClassRegistrar {
                classes: &mut classes,
                functions: &mut functions,
                defaults: &mut defaults,
            };
            module.register(&mut registrar)?;
        }
        debug!(
            library = %name,
            classes = classes.len(),
            functions = functions.len(),
            "library registered"
        );
        Ok(Self {
            name,
            path: path.into(),
            classes,
            functions,
            defaults,
            _module: module,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn object_creator(&self, class: &str) -> Option<ObjectCreator> {
        self.classes.get(class).copied()
    }

    pub fn function(&self, symbol: &str) -> Option<NativeFunction> {
        self.functions.get(symbol).copied()
    }

    pub fn default_class(&self, kind: ObjectKind) -> Option<&str> {
        self.defaults.get(&kind).map(String::as_str)
    }

    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        debug!(library = %self.name, path = %self.path.display(), "unloading library");
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("classes", &self.classes.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}
