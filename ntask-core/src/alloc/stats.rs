//! ## ntask-core::alloc::stats
//! **Block pool statistics**
//!
//! Counters describing how a `MemoryBlockPool` has been used. They exist for
//! sizing the pool, never for correctness.

use std::sync::atomic::{AtomicU64, Ordering};

/// Grant/failure/release counters for one pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    blocks_granted: AtomicU64,
    bytes_granted: AtomicU64,
    failed_requests: AtomicU64,
    releases: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_grant(&self, bytes: usize) {
        self.blocks_granted.fetch_add(1, Ordering::Relaxed);
        self.bytes_granted.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn blocks_granted(&self) -> u64 {
        self.blocks_granted.load(Ordering::Relaxed)
    }

    pub fn bytes_granted(&self) -> u64 {
        self.bytes_granted.load(Ordering::Relaxed)
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }
}
