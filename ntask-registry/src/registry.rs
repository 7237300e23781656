//! ## ntask-registry::registry
//! **Name-based construction of processing-stage objects**
//!
//! The registry owns every loaded library and resolves class names, function
//! symbols and per-kind defaults against them. Libraries are searched in
//! reverse load order, so a library loaded later shadows earlier ones.
//!
//! Three locks guard the state and none is taken while another is held:
//! - `libraries`: lifecycle phase plus the loaded libraries
//! - `defaults`: defaults set explicitly by the host
//! - `status`: counters, progress and the pending status message

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use ntask_config::NativeConfig;
use ntask_core::compare::{default_comparator, ComparatorFn};
use ntask_core::{KeyValueType, ObjectKind};
use ntask_telemetry::{LogDevice, LogRouter, MetricsRecorder};

use crate::builtin::builtin_library;
use crate::counters::{Counter, StatusBoard};
use crate::library::{Library, NativeFunction};
use crate::loader::LibraryLoader;
use crate::object::{NativeObject, ObjectCreator};
use crate::status::ProgressSource;
use crate::RegistryError;

/// Lifecycle of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    Uninitialized,
    Initialized,
    Released,
}

/// One loaded library as shown by diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySummary {
    pub name: String,
    pub path: PathBuf,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
}

struct LibraryTable {
    phase: RegistryPhase,
    libraries: Vec<Library>,
}

pub struct ObjectRegistry {
    config: NativeConfig,
    loader: Arc<dyn LibraryLoader>,
    log: LogRouter,
    metrics: MetricsRecorder,
    libraries: Mutex<LibraryTable>,
    defaults: Mutex<HashMap<ObjectKind, String>>,
    status: Mutex<StatusBoard>,
}

impl ObjectRegistry {
    /// Creates an uninitialized registry. Nothing is loaded until `init`.
    pub fn new(config: NativeConfig, loader: Arc<dyn LibraryLoader>) -> Result<Self, RegistryError> {
        config.check()?;
        let metrics = MetricsRecorder::new().map_err(|e| RegistryError::Metrics(e.to_string()))?;
        Ok(Self {
            config,
            loader,
            log: LogRouter::new(),
            metrics,
            libraries: Mutex::new(LibraryTable {
                phase: RegistryPhase::Uninitialized,
                libraries: Vec::new(),
            }),
            defaults: Mutex::new(HashMap::new()),
            status: Mutex::new(StatusBoard::default()),
        })
    }

    /// Uses `router` as the log sink retargeted at init and release.
    pub fn with_log_router(mut self, router: LogRouter) -> Self {
        self.log = router;
        self
    }

    pub fn config(&self) -> &NativeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn phase(&self) -> RegistryPhase {
        self.libraries.lock().phase
    }

    /// Opens the log device and loads the built-in library followed by the
    /// configured plugin libraries. Does nothing when already initialized.
    ///
    /// If any configured library fails to load, everything loaded so far is
    /// unloaded and the registry stays uninitialized.
    pub fn init(&self) -> Result<(), RegistryError> {
        let mut table = self.libraries.lock();
        if table.phase == RegistryPhase::Initialized {
            return Ok(());
        }

        match self.load_all() {
            Ok(libraries) => {
                table.libraries = libraries;
                table.phase = RegistryPhase::Initialized;
                self.metrics.libraries_loaded.set(table.libraries.len() as i64);
                info!(
                    "NativeTask library initialized with hadoop {}",
                    self.config.registry.host_version.as_deref().unwrap_or("unknown")
                );
                Ok(())
            }
            Err(e) => {
                if let Err(close) = self.log.reset() {
                    warn!(error = %close, "failed to close log device");
                }
                Err(e)
            }
        }
    }

    fn load_all(&self) -> Result<Vec<Library>, RegistryError> {
        self.log.open(&LogDevice::parse(&self.config.log.device))?;

        let mut libraries = vec![builtin_library()?];
        for (name, path) in parse_library_list(&self.config.registry.class_libraries) {
            info!(library = %name, path = %path, "Try to load library");
            match self.load_library(&name, &path) {
                Ok(library) => {
                    info!(library = %name, path = %path, "RegisterLibrary success");
                    libraries.push(library);
                }
                Err(e) => {
                    warn!(library = %name, path = %path, error = %e, "RegisterLibrary failed");
                    unload_all(libraries);
                    return Err(e);
                }
            }
        }
        Ok(libraries)
    }

    fn load_library(&self, name: &str, path: &str) -> Result<Library, RegistryError> {
        let path = Path::new(path);
        self.loader
            .load(path)
            .and_then(|module| Library::load(name, path, module))
            .map_err(|source| RegistryError::LibraryLoad {
                name: name.to_string(),
                path: path.to_path_buf(),
                source: Box::new(source),
            })
    }

    /// Initializes on demand.
    pub fn check_init(&self) -> Result<(), RegistryError> {
        if self.phase() == RegistryPhase::Initialized {
            return Ok(());
        }
        self.init()
            .map_err(|e| RegistryError::InitFailed(Box::new(e)))
    }

    /// Loads one more library. On failure the registry is left as it was.
    pub fn register_library(&self, path: &str, name: &str) -> Result<(), RegistryError> {
        self.check_init()?;
        let library = self.load_library(name, path)?;
        let mut table = self.libraries.lock();
        table.libraries.push(library);
        self.metrics.libraries_loaded.set(table.libraries.len() as i64);
        Ok(())
    }

    pub fn get_object_creator(&self, class: &str) -> Result<Option<ObjectCreator>, RegistryError> {
        self.check_init()?;
        let creator = self
            .libraries
            .lock()
            .libraries
            .iter()
            .rev()
            .find_map(|library| library.object_creator(class));
        if creator.is_none() {
            self.metrics.lookup_misses.inc();
        }
        Ok(creator)
    }

    pub fn create_object(&self, class: &str) -> Result<Option<Box<dyn NativeObject>>, RegistryError> {
        let Some(creator) = self.get_object_creator(class)? else {
            debug!(class, "class not registered");
            return Ok(None);
        };
        self.metrics.objects_created.inc();
        Ok(Some(creator()))
    }

    pub fn get_function(&self, symbol: &str) -> Result<Option<NativeFunction>, RegistryError> {
        self.check_init()?;
        let function = self
            .libraries
            .lock()
            .libraries
            .iter()
            .rev()
            .find_map(|library| library.function(symbol));
        if function.is_none() {
            self.metrics.lookup_misses.inc();
        }
        Ok(function)
    }

    /// Sets the default class of `kind`, overriding any library claim.
    pub fn set_default_class(&self, kind: ObjectKind, class: impl Into<String>) {
        self.defaults.lock().insert(kind, class.into());
    }

    /// Class name `kind` currently resolves to.
    pub fn default_class(&self, kind: ObjectKind) -> Option<String> {
        let explicit = self.defaults.lock().get(&kind).cloned();
        explicit.or_else(|| {
            self.libraries
                .lock()
                .libraries
                .iter()
                .rev()
                .find_map(|library| library.default_class(kind).map(str::to_string))
        })
    }

    pub fn create_default_object(
        &self,
        kind: ObjectKind,
    ) -> Result<Option<Box<dyn NativeObject>>, RegistryError> {
        self.check_init()?;
        match self.default_class(kind) {
            Some(class) => self.create_object(&class),
            None => {
                warn!("Default class for NativeObjectType {kind} not found");
                self.metrics.lookup_misses.inc();
                Ok(None)
            }
        }
    }

    /// Like `create_default_object`, with the kind given by its host name
    /// (`MapperType`, `FolderType`, ...).
    pub fn create_default_object_named(
        &self,
        kind: &str,
    ) -> Result<Option<Box<dyn NativeObject>>, RegistryError> {
        let kind: ObjectKind = kind.parse()?;
        self.create_default_object(kind)
    }

    /// Counter for `(group, name)`, created on first use.
    pub fn get_counter(&self, group: &str, name: &str) -> Arc<Counter> {
        self.status.lock().counter(group, name)
    }

    pub fn set_task_progress(&self, progress: f32) {
        self.status.lock().set_progress(progress);
    }

    /// Installs a source polled for progress at every snapshot.
    pub fn set_task_progress_source(&self, source: Option<Arc<dyn ProgressSource>>) {
        self.status.lock().set_progress_source(source);
    }

    pub fn task_progress(&self) -> f32 {
        let progress = self.status.lock().progress();
        debug!("Native side get progress {progress:.3}");
        progress
    }

    pub fn set_task_status(&self, status: impl Into<String>) {
        self.status.lock().set_status(status.into());
    }

    /// Replaces `buffer` with the encoded status snapshot. The pending status
    /// is cleared and counter deltas restart from the reported values.
    pub fn get_task_status_update(&self, buffer: &mut Vec<u8>) -> Result<(), RegistryError> {
        buffer.clear();
        let update = self.status.lock().take_update();
        update.encode(buffer)?;
        self.metrics.status_snapshots.inc();
        Ok(())
    }

    /// Comparator for a key type, or for an explicit function symbol.
    pub fn get_comparator(
        &self,
        key_type: KeyValueType,
        symbol: Option<&str>,
    ) -> Result<Option<ComparatorFn>, RegistryError> {
        match symbol {
            None => Ok(default_comparator(key_type)),
            Some(symbol) => Ok(self
                .get_function(symbol)?
                .and_then(|function| function.as_comparator())),
        }
    }

    /// Loaded libraries in load order.
    pub fn class_names(&self) -> Vec<LibrarySummary> {
        self.libraries
            .lock()
            .libraries
            .iter()
            .map(|library| LibrarySummary {
                name: library.name().to_string(),
                path: library.path().to_path_buf(),
                classes: library.class_names(),
                functions: library.function_names(),
            })
            .collect()
    }

    /// Unloads all libraries in reverse load order, drops the counters and
    /// explicit defaults, and returns logging to stderr. The registry may be
    /// initialized again afterwards.
    pub fn release(&self) {
        {
            let mut table = self.libraries.lock();
            unload_all(std::mem::take(&mut table.libraries));
            table.phase = RegistryPhase::Released;
            self.metrics.libraries_loaded.set(0);
        }
        self.status.lock().clear_counters();
        self.defaults.lock().clear();
        match self.log.reset() {
            Ok(true) => info!("log device closed"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "failed to close log device"),
        }
    }
}

fn unload_all(mut libraries: Vec<Library>) {
    while let Some(library) = libraries.pop() {
        drop(library);
    }
}

/// Parses a `name=path,name=path` list. Malformed entries are logged and
/// skipped.
fn parse_library_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parts: Vec<&str> = entry
                .split('=')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            match parts.as_slice() {
                [name, path] => Some((name.to_string(), path.to_string())),
                _ => {
                    warn!("Illegal native.class.library entry: [{entry}] in [{list}]");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use ntask_core::ErrorCategory;
    use tracing_test::traced_test;

    use crate::builtin::RoleObject;
    use crate::library::ClassRegistrar;
    use crate::loader::StaticLoader;
    use crate::status::StatusUpdate;

    const LIB_A: &str = "/plugins/liba.so";
    const LIB_B: &str = "/plugins/libb.so";
    const LIB_GHOST: &str = "/plugins/libghost.so";

    fn create_a_x() -> Box<dyn NativeObject> {
        Box::new(RoleObject::new(ObjectKind::Mapper, "a.X"))
    }

    fn create_a_only() -> Box<dyn NativeObject> {
        Box::new(RoleObject::new(ObjectKind::Reducer, "a.Only"))
    }

    fn create_b_x() -> Box<dyn NativeObject> {
        Box::new(RoleObject::new(ObjectKind::Mapper, "b.X"))
    }

    fn register_a(registrar: &mut ClassRegistrar<'_>) {
        registrar.register_class("X", create_a_x);
        registrar.register_class("Only", create_a_only);
    }

    fn register_b(registrar: &mut ClassRegistrar<'_>) {
        registrar.register_class("X", create_b_x);
        registrar.set_default_class(ObjectKind::Mapper, "X");
    }

    fn loader() -> Arc<StaticLoader> {
        Arc::new(
            StaticLoader::new()
                .with_module(LIB_A, register_a)
                .with_module(LIB_B, register_b),
        )
    }

    fn registry_with(libraries: &str, loader: Arc<StaticLoader>) -> ObjectRegistry {
        let mut config = NativeConfig::default();
        config.registry.class_libraries = libraries.to_string();
        ObjectRegistry::new(config, loader).unwrap()
    }

    fn class_of(object: Option<Box<dyn NativeObject>>) -> String {
        object.unwrap().class_name().to_string()
    }

    #[test]
    fn later_libraries_shadow_earlier_ones() {
        let registry = registry_with("a=/plugins/liba.so, b=/plugins/libb.so", loader());
        registry.init().unwrap();

        assert_eq!(class_of(registry.create_object("X").unwrap()), "b.X");
        assert_eq!(class_of(registry.create_object("Only").unwrap()), "a.Only");
        assert!(registry.create_object("Missing").unwrap().is_none());

        assert_eq!(
            class_of(registry.create_default_object(ObjectKind::Mapper).unwrap()),
            "b.X"
        );
        assert_eq!(
            class_of(registry.create_default_object(ObjectKind::Reducer).unwrap()),
            "NativeTask.Reducer"
        );

        let names: Vec<String> = registry.class_names().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["NativeTask", "a", "b"]);
        assert_eq!(registry.metrics().libraries_loaded.get(), 3);
    }

    #[test]
    fn explicit_default_wins_over_library_claim() {
        let registry = registry_with("b=/plugins/libb.so", loader());
        registry.init().unwrap();
        registry.set_default_class(ObjectKind::Mapper, "NativeTask.Mapper");
        assert_eq!(
            registry.default_class(ObjectKind::Mapper).as_deref(),
            Some("NativeTask.Mapper")
        );
        assert_eq!(
            class_of(registry.create_default_object_named("FolderType").unwrap()),
            "NativeTask.Folder"
        );
        assert!(registry.create_default_object_named("Nope").is_err());
    }

    #[test]
    fn explicit_default_survives_a_later_library_claim() {
        let registry = registry_with("", loader());
        registry.set_default_class(ObjectKind::Mapper, "NativeTask.Mapper");
        registry.register_library(LIB_B, "b").unwrap();
        assert_eq!(
            registry.default_class(ObjectKind::Mapper).as_deref(),
            Some("NativeTask.Mapper")
        );

        let unclaimed = registry_with("", loader());
        unclaimed.register_library(LIB_B, "b").unwrap();
        assert_eq!(unclaimed.default_class(ObjectKind::Mapper).as_deref(), Some("X"));
    }

    #[test]
    fn explicit_defaults_are_dropped_on_release() {
        let registry = registry_with("", loader());
        registry.set_default_class(ObjectKind::Partitioner, "Absent");
        assert!(registry
            .create_default_object(ObjectKind::Partitioner)
            .unwrap()
            .is_none());

        registry.release();
        registry.init().unwrap();
        assert_eq!(
            registry.default_class(ObjectKind::Partitioner).as_deref(),
            Some("NativeTask.Partitioner")
        );
    }

    #[traced_test]
    #[test]
    fn malformed_entries_are_skipped() {
        let registry = registry_with("a=/plugins/liba.so,bogus, ,x=y=z,=", loader());
        registry.init().unwrap();
        assert!(logs_contain("Illegal native.class.library entry"));
        assert!(logs_contain("NativeTask library initialized with hadoop unknown"));
        assert_eq!(registry.class_names().len(), 2);
    }

    #[test]
    fn failing_library_aborts_init() {
        let loader = loader();
        let registry = registry_with("a=/plugins/liba.so,ghost=/plugins/libghost.so", loader.clone());

        let err = registry.init().unwrap_err();
        assert!(matches!(err, RegistryError::LibraryLoad { ref name, .. } if name == "ghost"));
        assert_eq!(registry.phase(), RegistryPhase::Uninitialized);
        assert!(registry.class_names().is_empty());

        let err = registry.check_init().unwrap_err();
        assert!(matches!(err, RegistryError::InitFailed(_)));
        assert_eq!(err.category(), ErrorCategory::Io);

        loader.insert(LIB_GHOST, register_a);
        registry.check_init().unwrap();
        assert_eq!(registry.phase(), RegistryPhase::Initialized);
    }

    #[test]
    fn register_library_failure_keeps_registry_usable() {
        let registry = registry_with("", loader());
        let err = registry.register_library(LIB_GHOST, "ghost").unwrap_err();
        assert!(matches!(err, RegistryError::LibraryLoad { .. }));
        assert_eq!(class_of(registry.create_object("NativeTask.Mapper").unwrap()), "NativeTask.Mapper");

        registry.register_library(LIB_A, "a").unwrap();
        registry.register_library(LIB_B, "b").unwrap();
        assert_eq!(class_of(registry.create_object("X").unwrap()), "b.X");
    }

    #[test]
    fn release_allows_reinitialization() {
        let registry = registry_with("a=/plugins/liba.so", loader());
        registry.init().unwrap();
        registry.get_counter("task", "records").increase(5);

        registry.release();
        registry.release();
        assert_eq!(registry.phase(), RegistryPhase::Released);
        assert!(registry.class_names().is_empty());
        assert_eq!(registry.metrics().libraries_loaded.get(), 0);

        registry.init().unwrap();
        assert_eq!(registry.phase(), RegistryPhase::Initialized);
        let mut buffer = Vec::new();
        registry.get_task_status_update(&mut buffer).unwrap();
        assert!(StatusUpdate::decode(&buffer).unwrap().counters.is_empty());
    }

    #[test]
    fn counters_report_deltas() {
        let registry = registry_with("", loader());
        let records = registry.get_counter("task", "records");
        assert!(Arc::ptr_eq(&records, &registry.get_counter("task", "records")));

        let mut buffer = Vec::new();
        records.increase(10);
        registry.get_task_status_update(&mut buffer).unwrap();
        assert_eq!(StatusUpdate::decode(&buffer).unwrap().counters[0].delta, 10);

        records.increase(15);
        registry.get_task_status_update(&mut buffer).unwrap();
        let update = StatusUpdate::decode(&buffer).unwrap();
        assert_eq!(update.counters[0].delta, 15);
        assert_eq!(update.counters[0].group, "task");
        assert_eq!(records.get(), 25);
    }

    #[test]
    fn status_is_reported_once() {
        let registry = registry_with("", loader());
        registry.set_task_progress(0.42);
        registry.set_task_status("running");

        let mut buffer = vec![0xff; 16];
        registry.get_task_status_update(&mut buffer).unwrap();
        let first = StatusUpdate::decode(&buffer).unwrap();
        assert_eq!(first.progress, 0.42);
        assert_eq!(first.status, "running");

        registry.get_task_status_update(&mut buffer).unwrap();
        let second = StatusUpdate::decode(&buffer).unwrap();
        assert_eq!(second.progress, 0.42);
        assert_eq!(second.status, "");
        assert_eq!(registry.metrics().status_snapshots.get(), 2);
    }

    #[test]
    fn progress_source_is_polled() {
        let registry = registry_with("", loader());
        registry.set_task_progress(0.1);
        registry.set_task_progress_source(Some(Arc::new(|| 0.9f32)));
        assert_eq!(registry.task_progress(), 0.9);
    }

    #[test]
    fn comparators_resolve_by_type_and_symbol() {
        let registry = registry_with("", loader());

        let bytes = registry.get_comparator(KeyValueType::Text, None).unwrap().unwrap();
        assert_eq!(bytes(b"ab", b"abc").unwrap(), -1);

        let float = registry.get_comparator(KeyValueType::Float, None).unwrap().unwrap();
        let one = 1.0f32.to_be_bytes();
        assert_eq!(float(&one, &one).unwrap(), 1);

        let named = registry
            .get_comparator(KeyValueType::Unknown, Some("NativeTask.DoubleComparator"))
            .unwrap()
            .unwrap();
        assert!(named(&[0; 4], &[0; 8]).is_err());

        assert!(registry.get_comparator(KeyValueType::Md5Hash, None).unwrap().is_none());
        assert!(registry
            .get_comparator(KeyValueType::Text, Some("Ghost.Comparator"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn shared_across_threads() {
        let registry = Arc::new(registry_with("a=/plugins/liba.so", loader()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.get_counter("task", "records").increment();
                    }
                    registry.create_object("X").unwrap().is_some()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.get_counter("task", "records").get(), 8000);
        assert_eq!(registry.metrics().objects_created.get(), 8);
        assert_eq!(registry.class_names().len(), 2);
    }

    #[test]
    #[traced_test]
    fn log_file_is_closed_on_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("native.log");
        let mut config = NativeConfig::default();
        config.log.device = path.display().to_string();

        let router = LogRouter::new();
        let registry = ObjectRegistry::new(config, loader())
            .unwrap()
            .with_log_router(router.clone());
        registry.init().unwrap();
        assert_eq!(router.device(), LogDevice::File(path.clone()));
        assert!(path.exists());

        registry.release();
        assert_eq!(router.device(), LogDevice::Stderr);
        assert!(logs_contain("log device closed"));
        assert!(!logs_contain("failed to close log device"));
    }

    #[test]
    fn unopenable_log_device_fails_init() {
        let mut config = NativeConfig::default();
        config.log.device = "/nonexistent/dir/native.log".into();
        let registry = ObjectRegistry::new(config, loader()).unwrap();
        let err = registry.check_init().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(registry.phase(), RegistryPhase::Uninitialized);
    }

    #[test]
    fn library_list_parsing() {
        assert_eq!(
            parse_library_list(" a = /x/liba.so ,, b=/x/libb.so "),
            vec![
                ("a".to_string(), "/x/liba.so".to_string()),
                ("b".to_string(), "/x/libb.so".to_string()),
            ]
        );
        assert!(parse_library_list("").is_empty());
    }
}
