//! ## ntask-core::alloc::block
//! **Block descriptors handed out by the pool**

use std::fmt;

/// Opaque handle to a block issued by a `MemoryBlockPool`.
///
/// Handles are plain indices; the pool validates them on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(pub(crate) usize);

impl BlockHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A contiguous range of the pool's backing region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    offset: usize,
    size: usize,
    used: usize,
}

impl MemoryBlock {
    pub(crate) fn new(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            used: 0,
        }
    }

    /// Offset of the first byte inside the backing region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.size - self.used
    }

    pub(crate) fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.remaining());
        self.used += len;
    }
}

impl fmt::Display for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryBlock(offset={}, size={}, used={})",
            self.offset, self.size, self.used
        )
    }
}
