//! Eviction Cache Module
//!
//! Byte-bounded file cache combining the LRU heap with size accounting.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruHeap};

// == Eviction Cache ==
/// In-memory file cache bounded by total byte size.
///
/// Has no concurrency control of its own; the coordinator task is its only
/// owner.
#[derive(Debug)]
pub struct EvictionCache {
    /// Resident entries ordered by recency, with name lookup
    heap: LruHeap,
    /// Sum of resident entry sizes
    current_size: usize,
    /// Byte budget
    max_size: usize,
    /// Monotonic access counter used to order entries
    next_seq: u64,
    /// Performance statistics
    stats: CacheStats,
}

impl EvictionCache {
    // == Constructor ==
    /// Creates an empty cache with the given byte budget.
    pub fn new(max_size: usize) -> Self {
        Self {
            heap: LruHeap::new(),
            current_size: 0,
            max_size,
            next_seq: 0,
            stats: CacheStats::new(max_size),
        }
    }

    // == Put ==
    /// Inserts a file body under `name`.
    ///
    /// First writer wins: if `name` is already resident nothing changes and
    /// false is returned. Otherwise least recently used entries are evicted
    /// until the body fits or the cache is empty, so a body larger than the
    /// whole budget still gets in after everything else is gone.
    pub fn put(&mut self, name: &str, data: impl Into<Arc<[u8]>>) -> bool {
        if self.heap.contains(name) {
            debug!(name, "put ignored, already cached");
            return false;
        }

        let data = data.into();
        while !self.heap.is_empty() && self.current_size + data.len() > self.max_size {
            if let Some(evicted) = self.heap.pop_oldest() {
                self.current_size -= evicted.size();
                self.stats.record_eviction();
                debug!(name = %evicted.name, size = evicted.size(), "evicted");
            }
        }

        let size = data.len();
        let seq = self.advance_seq();
        self.heap.push(CacheEntry::new(Arc::from(name), data, seq));
        self.current_size += size;
        self.stats.record_insertion();
        true
    }

    // == Get ==
    /// Returns the body cached under `name` and marks it most recently used.
    pub fn get(&mut self, name: &str) -> Option<Arc<[u8]>> {
        if !self.heap.contains(name) {
            self.stats.record_miss();
            return None;
        }
        let seq = self.advance_seq();
        let data = self.heap.touch(name, seq).map(|entry| entry.data.clone());
        self.stats.record_hit();
        data
    }

    pub fn contains(&self, name: &str) -> bool {
        self.heap.contains(name)
    }

    /// Name of the entry that would be evicted next.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.heap.peek_oldest().map(|entry| &*entry.name)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn current_size(&self) -> usize {
        self.current_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Counts a captured file that never made it into the cache.
    pub fn record_discard(&mut self) {
        self.stats.record_discard();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.heap.len(), self.current_size);
        stats
    }

    fn advance_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.heap.assert_invariants();
        let total: usize = self.heap.iter().map(CacheEntry::size).sum();
        assert_eq!(total, self.current_size);
    }
}
