//! Bounded result cache keyed by serialized arguments.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

/// Serializes an argument list into a cache key.
///
/// The encoding is JSON, so structurally equal argument lists map to the
/// same key and positional order is preserved. Returns `None` when the
/// arguments cannot be serialized; such calls bypass the cache.
pub fn cache_key<A: Serialize + ?Sized>(args: &A) -> Option<String> {
    serde_json::to_string(args).ok()
}

/// Result cache evicting in insertion order.
///
/// Reads never reorder entries. Overwriting an existing key keeps its
/// original position. A capacity of zero disables the cache.
#[derive(Debug)]
pub(crate) struct ResultCache<T> {
    capacity: usize,
    entries: HashMap<String, T>,
    order: VecDeque<String>,
}

impl<T> ResultCache<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Stores a value, returning the key evicted to make room (if any).
    pub(crate) fn insert(&mut self, key: String, value: T) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        if self.entries.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            self.entries.remove(&oldest);
            return Some(oldest);
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
