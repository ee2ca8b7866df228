//! Write Order Module
//!
//! Tracks the order in which keys were last written, for capacity eviction.

use std::collections::VecDeque;

// == Write Order ==
/// Tracks write order for oldest-first eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently written
/// - Back = Oldest write
///
/// Reads do not reorder keys.
#[derive(Debug, Default)]
pub struct WriteOrder {
    order: VecDeque<String>,
}

impl WriteOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as just written (moves to front).
    pub fn record_write(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Oldest First ==
    /// Snapshot of tracked keys, oldest write first.
    pub fn oldest_first(&self) -> Vec<String> {
        self.order.iter().rev().cloned().collect()
    }

    // == Peek Oldest ==
    /// Returns the oldest written key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
