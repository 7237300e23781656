//! The `NativeTask` library every registry loads first.

use std::any::Any;

use ntask_core::compare::{bytes_comparator, double_comparator, float_comparator};
use ntask_core::ObjectKind;

use crate::library::{ClassRegistrar, Library, NativeFunction};
use crate::loader::StaticModule;
use crate::object::NativeObject;
use crate::RegistryError;

pub const BUILTIN_LIBRARY_NAME: &str = "NativeTask";
pub const BUILTIN_LIBRARY_PATH: &str = "libnativetask.so";

/// Stage object that only knows its role and class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleObject {
    kind: ObjectKind,
    class_name: &'static str,
}

impl RoleObject {
    pub fn new(kind: ObjectKind, class_name: &'static str) -> Self {
        Self { kind, class_name }
    }
}

impl NativeObject for RoleObject {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn class_name(&self) -> &str {
        self.class_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

const BATCH_HANDLER: &str = "NativeTask.BatchHandler";
const MAPPER: &str = "NativeTask.Mapper";
const REDUCER: &str = "NativeTask.Reducer";
const PARTITIONER: &str = "NativeTask.Partitioner";
const FOLDER: &str = "NativeTask.Folder";

fn create_batch_handler() -> Box<dyn NativeObject> {
    Box::new(RoleObject::new(ObjectKind::BatchHandler, BATCH_HANDLER))
}

fn create_mapper() -> Box<dyn NativeObject> {
    Box::new(RoleObject::new(ObjectKind::Mapper, MAPPER))
}

fn create_reducer() -> Box<dyn NativeObject> {
    Box::new(RoleObject::new(ObjectKind::Reducer, REDUCER))
}

fn create_partitioner() -> Box<dyn NativeObject> {
    Box::new(RoleObject::new(ObjectKind::Partitioner, PARTITIONER))
}

fn create_folder() -> Box<dyn NativeObject> {
    Box::new(RoleObject::new(ObjectKind::Combiner, FOLDER))
}

/// Entry point of the built-in library.
pub fn register_builtin(registrar: &mut ClassRegistrar<'_>) {
    registrar.register_class(BATCH_HANDLER, create_batch_handler);
    registrar.register_class(MAPPER, create_mapper);
    registrar.register_class(REDUCER, create_reducer);
    registrar.register_class(PARTITIONER, create_partitioner);
    registrar.register_class(FOLDER, create_folder);

    registrar.register_function(
        "NativeTask.BytesComparator",
        NativeFunction::Comparator(bytes_comparator),
    );
    registrar.register_function(
        "NativeTask.FloatComparator",
        NativeFunction::Comparator(float_comparator),
    );
    registrar.register_function(
        "NativeTask.DoubleComparator",
        NativeFunction::Comparator(double_comparator),
    );

    registrar.set_default_class(ObjectKind::BatchHandler, BATCH_HANDLER);
    registrar.set_default_class(ObjectKind::Mapper, MAPPER);
    registrar.set_default_class(ObjectKind::Reducer, REDUCER);
    registrar.set_default_class(ObjectKind::Partitioner, PARTITIONER);
    registrar.set_default_class(ObjectKind::Combiner, FOLDER);
}

pub fn builtin_library() -> Result<Library, RegistryError> {
    Library::load(
        BUILTIN_LIBRARY_NAME,
        BUILTIN_LIBRARY_PATH,
        Box::new(StaticModule::new(register_builtin)),
    )
}
