//! Text Cache Statistics Module
//!
//! Tracks hits and misses per text type and in aggregate.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

// == Hit Counts ==
/// Hit and miss counters for one text type (or for all of them).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HitCounts {
    /// Number of gets that found an entry
    pub hits: u64,
    /// Number of gets that found nothing
    pub misses: u64,
}

impl HitCounts {
    // == Hit Rate ==
    /// Percentage of gets that hit, in 0..=100.
    ///
    /// Returns 100.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            100.0
        } else {
            100.0 * self.hits as f64 / total as f64
        }
    }
}

// == Text Cache Stats ==
/// Hit/miss accounting shared by every text cache.
#[derive(Debug, Default)]
pub struct TextCacheStats {
    per_type: Mutex<HashMap<String, HitCounts>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TextCacheStats {
    // == Constructor ==
    /// Creates statistics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self, text_type: &str) {
        self.per_type
            .lock()
            .entry(text_type.to_string())
            .or_default()
            .hits += 1;
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    pub fn record_miss(&self, text_type: &str) {
        self.per_type
            .lock()
            .entry(text_type.to_string())
            .or_default()
            .misses += 1;
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Counters for one text type; zero if it was never requested.
    pub fn counts(&self, text_type: &str) -> HitCounts {
        self.per_type
            .lock()
            .get(text_type)
            .copied()
            .unwrap_or_default()
    }

    /// Counters across all text types.
    pub fn total(&self) -> HitCounts {
        HitCounts {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Counters for every text type requested so far, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, HitCounts> {
        self.per_type
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
