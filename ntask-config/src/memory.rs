//! Memory arena sizing.

use serde::{Deserialize, Serialize};
use validator::Validate;

use ntask_core::alloc::{DEFAULT_MIN_BLOCK_SIZE, MAX_POOL_CAPACITY};

/// Sizing of the per-task `MemoryBlockPool`.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Arena capacity in bytes, rounded up to `min_block_size` at init.
    #[serde(default = "default_capacity")]
    #[validate(range(max = MAX_POOL_CAPACITY))]
    pub capacity: u64,

    /// Smallest block the pool hands out (bytes).
    #[serde(default = "default_min_block_size")]
    #[validate(range(min = 1))]
    pub min_block_size: usize,
}

fn default_capacity() -> u64 {
    64 * 1024 * 1024
}

fn default_min_block_size() -> usize {
    DEFAULT_MIN_BLOCK_SIZE
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            min_block_size: default_min_block_size(),
        }
    }
}
