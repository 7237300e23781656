//! ## ntask-core::alloc::arena
//! **Bump-style block pool over one contiguous region**
//!
//! A `MemoryBlockPool` reserves a single backing region at `init` and carves
//! blocks off its unused tail. The region never grows and never moves, so a
//! block's offset stays valid for the lifetime of the pool. Blocks are only
//! reclaimed together, by `release` or by dropping the pool.
//!
//! The pool is not synchronized. It is meant to be owned by one task thread;
//! use one pool per thread when blocks are needed concurrently.

use std::fmt;

use tracing::{debug, info};

use super::block::{BlockHandle, MemoryBlock};
use super::stats::PoolStats;
use crate::error::NativeError;

/// Largest capacity a pool may be initialized with (3 GiB).
pub const MAX_POOL_CAPACITY: u64 = 3 << 30;

pub const DEFAULT_MIN_BLOCK_SIZE: usize = 32 * 1024;

/// Extra bytes allocated past the end of the region so fixed-width copy
/// routines may overrun the last block slightly.
pub const TAIL_PADDING: usize = std::mem::size_of::<u64>();

/// Arena handing out sequential blocks of one backing region.
#[derive(Debug)]
pub struct MemoryBlockPool {
    base: Vec<u8>,
    capacity: usize,
    min_block_size: usize,
    used: usize,
    blocks: Vec<MemoryBlock>,
    inited: bool,
    stats: PoolStats,
}

impl MemoryBlockPool {
    /// Creates an uninitialized pool. No memory is reserved until `init`.
    pub fn new() -> Self {
        Self {
            base: Vec::new(),
            capacity: 0,
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            used: 0,
            blocks: Vec::new(),
            inited: false,
            stats: PoolStats::new(),
        }
    }

    /// Reserves the backing region.
    ///
    /// `capacity` is rounded up to the next multiple of `min_block_size`.
    ///
    /// # Preconditions
    /// Calling `init` on an initialized pool discards the previous region;
    /// every handle issued before becomes invalid.
    pub fn init(&mut self, capacity: u64, min_block_size: usize) -> Result<(), NativeError> {
        if min_block_size == 0 {
            return Err(NativeError::InvalidArgument(
                "min_block_size must be greater than zero".into(),
            ));
        }
        if capacity > MAX_POOL_CAPACITY {
            return Err(NativeError::OutOfMemory {
                requested: capacity,
                available: MAX_POOL_CAPACITY,
            });
        }

        let rounded = round_up(capacity, min_block_size as u64);
        info!(
            "Native MemoryBlockPool: min_block_size {}K, capacity {}M",
            min_block_size / 1024,
            rounded / 1024 / 1024
        );

        let out_of_memory = || NativeError::OutOfMemory {
            requested: rounded,
            available: 0,
        };
        let region_len = usize::try_from(rounded)
            .ok()
            .and_then(|len| len.checked_add(TAIL_PADDING))
            .ok_or_else(out_of_memory)?;

        let mut base = Vec::new();
        base.try_reserve_exact(region_len)
            .map_err(|_| out_of_memory())?;
        base.resize(region_len, 0);

        self.base = base;
        self.capacity = region_len - TAIL_PADDING;
        self.min_block_size = min_block_size;
        self.used = 0;
        self.blocks.clear();
        self.inited = true;
        Ok(())
    }

    /// Issues a new block of exactly `size` bytes from the unused tail.
    ///
    /// Fails without side effects when fewer than `size` bytes remain.
    pub fn allocate_block(&mut self, size: usize) -> Result<BlockHandle, NativeError> {
        if !self.inited {
            return Err(NativeError::NotInitialized);
        }
        let available = self.capacity - self.used;
        if size > available {
            self.stats.record_failure();
            debug!(size, available, "memory block request rejected");
            return Err(NativeError::OutOfMemory {
                requested: size as u64,
                available: available as u64,
            });
        }

        self.blocks.push(MemoryBlock::new(self.used, size));
        self.used += size;
        self.stats.record_grant(size);
        Ok(BlockHandle(self.blocks.len() - 1))
    }

    /// Issues a block of `min_block_size` bytes.
    pub fn allocate_min_block(&mut self) -> Result<BlockHandle, NativeError> {
        self.allocate_block(self.min_block_size)
    }

    pub fn block(&self, handle: BlockHandle) -> Result<&MemoryBlock, NativeError> {
        self.blocks
            .get(handle.0)
            .ok_or(NativeError::InvalidBlock(handle.0))
    }

    /// Whole block, including bytes not yet marked used.
    pub fn bytes(&self, handle: BlockHandle) -> Result<&[u8], NativeError> {
        let block = self.block(handle)?;
        Ok(&self.base[block.offset()..block.offset() + block.size()])
    }

    /// Mutable view over the whole block.
    pub fn bytes_mut(&mut self, handle: BlockHandle) -> Result<&mut [u8], NativeError> {
        let block = self.block(handle)?;
        let (start, end) = (block.offset(), block.offset() + block.size());
        Ok(&mut self.base[start..end])
    }

    /// The used prefix of a block.
    pub fn filled(&self, handle: BlockHandle) -> Result<&[u8], NativeError> {
        let block = self.block(handle)?;
        Ok(&self.base[block.offset()..block.offset() + block.used()])
    }

    /// The unused suffix of a block, for writing in place before `commit`.
    pub fn spare_mut(&mut self, handle: BlockHandle) -> Result<&mut [u8], NativeError> {
        let block = self.block(handle)?;
        let (start, end) = (block.offset() + block.used(), block.offset() + block.size());
        Ok(&mut self.base[start..end])
    }

    /// Marks `len` more bytes of the block as used.
    pub fn commit(&mut self, handle: BlockHandle, len: usize) -> Result<(), NativeError> {
        let block = self
            .blocks
            .get_mut(handle.0)
            .ok_or(NativeError::InvalidBlock(handle.0))?;
        if len > block.remaining() {
            return Err(NativeError::BlockOverflow {
                block: handle.0,
                requested: len,
                remaining: block.remaining(),
            });
        }
        block.advance(len);
        Ok(())
    }

    /// Copies `data` after the used prefix of a block.
    ///
    /// Returns the offset of the copy inside the block.
    pub fn append(&mut self, handle: BlockHandle, data: &[u8]) -> Result<usize, NativeError> {
        let block = self.block(handle)?;
        if data.len() > block.remaining() {
            return Err(NativeError::BlockOverflow {
                block: handle.0,
                requested: data.len(),
                remaining: block.remaining(),
            });
        }
        let at = block.used();
        let start = block.offset() + at;
        self.base[start..start + data.len()].copy_from_slice(data);
        self.commit(handle, data.len())?;
        Ok(at)
    }

    /// Frees the backing region. A no-op on an uninitialized pool.
    pub fn release(&mut self) {
        if !self.inited {
            return;
        }
        self.base = Vec::new();
        self.blocks.clear();
        self.capacity = 0;
        self.used = 0;
        self.inited = false;
        self.stats.record_release();
    }

    pub fn is_initialized(&self) -> bool {
        self.inited
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_block_size(&self) -> usize {
        self.min_block_size
    }

    /// Cumulative size of all issued blocks.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.blocks.iter()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Snapshot used for tuning output.
    pub fn dump(&self) -> PoolReport {
        PoolReport {
            capacity: self.capacity,
            blocks: self.blocks.len(),
            used: self.used,
            filled: self.blocks.iter().map(MemoryBlock::used).sum(),
        }
    }
}

impl Default for MemoryBlockPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Usage summary of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub capacity: usize,
    pub blocks: usize,
    /// Bytes issued as blocks.
    pub used: usize,
    /// Bytes actually written inside issued blocks.
    pub filled: usize,
}

impl PoolReport {
    /// Average fill ratio of the issued blocks.
    pub fn utilization(&self) -> f64 {
        if self.used == 0 {
            0.0
        } else {
            self.filled as f64 / self.used as f64
        }
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capacity: {} Blocks: {} Used: {}/{} {:.3}",
            self.capacity,
            self.blocks,
            self.filled,
            self.used,
            self.utilization()
        )
    }
}

fn round_up(value: u64, multiple: u64) -> u64 {
    value.div_ceil(multiple) * multiple
}
