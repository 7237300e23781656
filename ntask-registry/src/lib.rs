//! # ntask-registry
//!
//! Object registry for native task stages: loads plugin libraries, creates
//! objects by class name or by role, resolves key comparators, and keeps the
//! counters and status reported back to the host.
//!
//! ### Key Submodules:
//! - `registry`: the `ObjectRegistry` context object and its lifecycle
//! - `library` / `loader`: loaded libraries and the loading seam
//! - `builtin`: the `NativeTask` library loaded by every registry
//! - `counters` / `status`: task counters and status snapshots

pub mod builtin;
pub mod counters;
mod error;
pub mod library;
pub mod loader;
pub mod object;
pub mod registry;
pub mod status;

pub use counters::Counter;
pub use error::RegistryError;
pub use library::{ClassRegistrar, Library, NativeFunction};
pub use loader::{LibraryLoader, PluginModule, StaticLoader, StaticModule, PLUGIN_ENTRY_SYMBOL};
pub use object::{NativeObject, ObjectCreator};
pub use registry::{LibrarySummary, ObjectRegistry, RegistryPhase};
pub use status::{CounterDelta, ProgressSource, StatusUpdate};
