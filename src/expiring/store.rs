//! Expiring Object Cache Store
//!
//! HashMap storage with per-entry expiration and counter-triggered sweeps.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::expiring::{Clock, ExpiringEntry, SystemClock, DEFAULT_SWEEP_EVERY};

// == Expiring Object Cache ==
/// Time-based cache of arbitrary items.
///
/// Every `sweep_every`-th `get` runs `clean`, so expired entries are
/// reclaimed without a background thread. All map access goes through one
/// mutex; `clean` additionally refuses to run while another sweep is active.
#[derive(Debug)]
pub struct ExpiringObjectCache<K, V> {
    /// Items and their expiration times
    entries: Mutex<HashMap<K, ExpiringEntry<V>>>,
    /// Lifetime in seconds used by `put`
    default_lifetime: u64,
    /// Number of gets between sweeps
    sweep_every: u64,
    /// Gets since construction
    gets: AtomicU64,
    /// Set while a sweep is running
    cleaning: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl<K, V> ExpiringObjectCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache with the given default lifetime in seconds.
    pub fn new(default_lifetime: u64) -> Self {
        Self::with_clock(default_lifetime, DEFAULT_SWEEP_EVERY, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit sweep period and clock.
    ///
    /// A `sweep_every` of 0 is treated as 1.
    pub fn with_clock(default_lifetime: u64, sweep_every: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_lifetime,
            sweep_every: sweep_every.max(1),
            gets: AtomicU64::new(0),
            cleaning: AtomicBool::new(false),
            clock,
        }
    }

    // == Put ==
    /// Stores `item` for the default lifetime, replacing any existing entry.
    pub fn put(&self, key: K, item: V) {
        self.put_with_lifetime(key, item, self.default_lifetime);
    }

    /// Stores `item` for `lifetime_secs`, replacing any existing entry.
    pub fn put_with_lifetime(&self, key: K, item: V, lifetime_secs: u64) {
        let entry = ExpiringEntry::new(item, self.clock.now_ms(), lifetime_secs);
        self.entries.lock().insert(key, entry);
    }

    // == Guarantee ==
    /// Makes a live entry last at least `min_lifetime_secs` from now.
    ///
    /// Returns false if the key is absent or already expired; an expired
    /// entry is not brought back.
    pub fn guarantee(&self, key: &K, min_lifetime_secs: u64) -> bool {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.extend_to(now.saturating_add(min_lifetime_secs.saturating_mul(1000)));
                true
            }
            _ => false,
        }
    }

    // == Get ==
    /// Returns the item for `key` if present and not expired.
    ///
    /// An expired entry found here is removed. Every `sweep_every`-th call
    /// sweeps the whole cache first.
    pub fn get(&self, key: &K) -> Option<V> {
        let gets = self.gets.fetch_add(1, Ordering::Relaxed) + 1;
        if gets % self.sweep_every == 0 {
            self.clean();
        }

        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.item.clone()),
            None => None,
        }
    }

    // == Remove ==
    /// Removes an entry, returning its item if it had not expired.
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.item)
    }

    // == Clean ==
    /// Removes every expired entry and returns how many were removed.
    ///
    /// Returns 0 without doing anything if a sweep is already running.
    pub fn clean(&self) -> usize {
        if self
            .cleaning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return 0;
        }

        let now = self.clock.now_ms();
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            before - entries.len()
        };

        self.cleaning.store(false, Ordering::Release);
        debug!("Expiring cache sweep removed {} entries", removed);
        removed
    }

    // == Reset ==
    /// Drops every entry.
    pub fn reset(&self) {
        self.entries.lock().clear();
    }

    // == Time To Live ==
    /// Remaining lifetime of a live entry.
    pub fn time_to_live(&self, key: &K) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now)))
    }

    // == Length ==
    /// Number of stored entries, expired ones not yet removed included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn default_lifetime(&self) -> u64 {
        self.default_lifetime
    }

    pub fn sweep_every(&self) -> u64 {
        self.sweep_every
    }
}
