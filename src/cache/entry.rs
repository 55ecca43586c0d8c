//! Cache Entry Module
//!
//! Defines a single resident file in the eviction cache.

use std::sync::Arc;
use std::time::Instant;

// == Cache Entry ==
/// A cached file body together with its recency metadata.
///
/// Entries order by `(last_accessed, access_seq)`. The sequence number is
/// strictly increasing per cache, so two entries never compare equal even
/// when the clock reports the same instant for both.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File name, the unique key
    pub name: Arc<str>,
    /// File body
    pub data: Arc<[u8]>,
    /// Last time this entry was inserted or read
    pub last_accessed: Instant,
    /// Access counter value at `last_accessed`
    pub access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the given access sequence.
    pub fn new(name: Arc<str>, data: Arc<[u8]>, access_seq: u64) -> Self {
        Self {
            name,
            data,
            last_accessed: Instant::now(),
            access_seq,
        }
    }

    // == Touch ==
    /// Marks the entry as accessed now.
    pub fn touch(&mut self, access_seq: u64) {
        self.last_accessed = Instant::now();
        self.access_seq = access_seq;
    }

    /// Size of the stored body in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if `self` was accessed before `other`.
    pub fn is_older_than(&self, other: &CacheEntry) -> bool {
        (self.last_accessed, self.access_seq) < (other.last_accessed, other.access_seq)
    }
}
