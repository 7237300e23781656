//! # ntask-core
//!
//! Foundation layer shared by every other `ntask` crate.
//!
//! ### Key Submodules:
//! - `alloc`: the task memory arena (`MemoryBlockPool`) and its statistics
//! - `compare`: built-in key comparators used for sort-order dispatch
//! - `types`: fixed type tags (object kinds, key types, checksum trailers)
//! - `wire`: Writable-compatible big-endian encoding helpers
//! - `error`: error categories shared across the workspace

pub mod alloc;
pub mod compare;
pub mod error;
pub mod types;
pub mod wire;

pub use error::{ErrorCategory, NativeError};
pub use types::{ChecksumTrailer, KeyValueType, ObjectKind};
