//! ## ntask-core::alloc
//! **Task memory arena**
//!
//! One large region is reserved per task and sliced into blocks on demand.
//! Blocks are never freed individually; the region goes away all at once.
//!
//! ### Key Submodules:
//! - `arena/`: `MemoryBlockPool`, the bump-style block issuer
//! - `block/`: `MemoryBlock` descriptors and the `BlockHandle` returned to callers
//! - `stats/`: grant/failure/release counters for tuning

pub mod arena;
pub mod block;
pub mod stats;

pub use arena::{
    MemoryBlockPool, PoolReport, DEFAULT_MIN_BLOCK_SIZE, MAX_POOL_CAPACITY, TAIL_PADDING,
};
pub use block::{BlockHandle, MemoryBlock};
pub use stats::PoolStats;
