//! LRU Heap Module
//!
//! Array-backed binary min-heap of cache entries keyed by recency, with a side
//! table from name to slot so any entry can be re-prioritised in O(log n).

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::CacheEntry;

// == LRU Heap ==
/// Min-heap over `CacheEntry` recency.
///
/// - Slot 0 = least recently used
/// - `slots[name]` is always the index of `name` in `nodes`
#[derive(Debug, Default)]
pub struct LruHeap {
    /// Heap-ordered entries
    nodes: Vec<CacheEntry>,
    /// Name to current slot in `nodes`
    slots: HashMap<Arc<str>, usize>,
}

impl LruHeap {
    // == Constructor ==
    /// Creates a new empty heap.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            slots: HashMap::new(),
        }
    }

    // == Push ==
    /// Adds an entry to the heap.
    ///
    /// Returns false and leaves the heap untouched if the name is already
    /// present.
    pub fn push(&mut self, entry: CacheEntry) -> bool {
        if self.slots.contains_key(&entry.name) {
            return false;
        }
        let slot = self.nodes.len();
        self.slots.insert(entry.name.clone(), slot);
        self.nodes.push(entry);
        self.sift_up(slot);
        true
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<CacheEntry> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.swap(0, last);
        let entry = self.nodes.pop()?;
        self.slots.remove(&entry.name);
        if !self.nodes.is_empty() {
            self.sift_down(0);
        }
        Some(entry)
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<&CacheEntry> {
        self.nodes.first()
    }

    // == Touch ==
    /// Marks `name` as accessed with the given sequence and restores heap
    /// order around its slot.
    pub fn touch(&mut self, name: &str, access_seq: u64) -> Option<&CacheEntry> {
        let slot = *self.slots.get(name)?;
        self.nodes[slot].touch(access_seq);
        let slot = self.fix(slot);
        self.nodes.get(slot)
    }

    /// Looks up an entry by name without changing its recency.
    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.slots.get(name).map(|&slot| &self.nodes[slot])
    }

    /// Current slot of `name`, if resident.
    #[cfg(test)]
    pub(crate) fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates entries in heap (not recency) order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.nodes.iter()
    }

    // == Heap Maintenance ==
    /// Moves the entry at `slot` up or down until order holds, returning its
    /// final slot.
    fn fix(&mut self, slot: usize) -> usize {
        let moved = self.sift_up(slot);
        if moved != slot {
            return moved;
        }
        self.sift_down(slot)
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.nodes[slot].is_older_than(&self.nodes[parent]) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) -> usize {
        let len = self.nodes.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut oldest = slot;
            if left < len && self.nodes[left].is_older_than(&self.nodes[oldest]) {
                oldest = left;
            }
            if right < len && self.nodes[right].is_older_than(&self.nodes[oldest]) {
                oldest = right;
            }
            if oldest == slot {
                return slot;
            }
            self.swap(slot, oldest);
            slot = oldest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.nodes.swap(a, b);
        self.slots.insert(self.nodes[a].name.clone(), a);
        self.slots.insert(self.nodes[b].name.clone(), b);
    }

    /// Panics if the side table or heap order is broken.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.nodes.len(), self.slots.len());
        for (slot, entry) in self.nodes.iter().enumerate() {
            assert_eq!(self.slots.get(&entry.name), Some(&slot));
            if slot > 0 {
                let parent = (slot - 1) / 2;
                assert!(!entry.is_older_than(&self.nodes[parent]));
            }
        }
    }
}
