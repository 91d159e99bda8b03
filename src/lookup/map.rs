//! Cache Map Module
//!
//! The normalized-key map every row-data cache stores its entries in.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::lookup::{CacheKey, KeyValue};

// == Cache Map ==
/// Map from normalized key to value.
///
/// Every insert and every read normalizes the key first, so text keys form
/// a case-insensitive key space. Inserts overwrite (last write wins).
#[derive(Debug)]
pub struct CacheMap<V> {
    entries: RwLock<HashMap<CacheKey, V>>,
}

impl<V> Default for CacheMap<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> CacheMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.read().get(key.normalized().as_ref()).cloned()
    }

    // == Insert ==
    /// Stores a key/value pair, returning the value it replaced.
    pub fn insert(&self, entry: KeyValue<V>) -> Option<V> {
        let (key, value) = entry.into_parts();
        self.entries.write().insert(key.normalize(), value)
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key.normalized().as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    // == Snapshot ==
    /// Copies the entries out, ordered by key.
    pub fn snapshot(&self) -> Vec<(CacheKey, V)> {
        let mut entries: Vec<(CacheKey, V)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
