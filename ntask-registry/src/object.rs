//! Polymorphic processing-stage objects produced by the registry.

use std::any::Any;

use ntask_core::ObjectKind;

/// A processing-stage implementation created by name.
pub trait NativeObject: Send {
    /// Role this object plays in the task.
    fn kind(&self) -> ObjectKind;

    /// Registered class name the object was created under.
    fn class_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Zero-argument factory stored in a library's class table.
pub type ObjectCreator = fn() -> Box<dyn NativeObject>;
