//! Cache Module
//!
//! Provides the byte-bounded in-memory file cache with LRU eviction.

mod entry;
mod heap;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use heap::LruHeap;
pub use stats::CacheStats;
pub use store::EvictionCache;

// == Public Constants ==
/// Default cache byte budget
pub const DEFAULT_MAX_CACHE_BYTES: usize = 60 * 1024 * 1024; // 60 MiB
