//! Fast Text Cache
//!
//! A disk text cache fronted by an in-memory map. Text is promoted into
//! memory only when a read finds it on disk, and only while enough of the
//! machine's memory is free.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use sysinfo::System;
use tracing::debug;

use crate::error::Result;
use crate::text::{DiskTextZipCache, TextCache, TextCacheStats};

// == Memory Probe ==
/// Reports how much memory is currently free.
pub trait MemoryProbe: Send + Sync {
    /// Free memory as a fraction of total memory, in 0.0..=1.0.
    fn free_fraction(&self) -> f64;
}

/// Probe reading the host's available memory.
pub struct SystemMemoryProbe {
    system: Mutex<System>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn free_fraction(&self) -> f64 {
        let mut system = self.system.lock();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        system.available_memory() as f64 / total as f64
    }
}

/// Probe returning a settable value.
#[derive(Debug)]
pub struct FixedMemoryProbe {
    fraction: Mutex<f64>,
}

impl FixedMemoryProbe {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: Mutex::new(fraction),
        }
    }

    pub fn set(&self, fraction: f64) {
        *self.fraction.lock() = fraction;
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn free_fraction(&self) -> f64 {
        *self.fraction.lock()
    }
}

// == Memory Tier ==
type TextKey = (String, String);

/// In-memory copies plus the bookkeeping that keeps them from going stale.
///
/// Every put or remove stamps its key with a fresh version, and every clear
/// bumps `clears`. A read promotes only if neither changed between the stamp
/// it took before reading disk and the moment it inserts.
#[derive(Debug, Default)]
struct MemoryTier {
    entries: HashMap<TextKey, String>,
    versions: HashMap<TextKey, u64>,
    next_version: u64,
    clears: u64,
}

/// What a reader saw before going to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    version: u64,
    clears: u64,
}

impl MemoryTier {
    fn stamp(&self, key: &TextKey) -> Stamp {
        Stamp {
            version: self.versions.get(key).copied().unwrap_or(0),
            clears: self.clears,
        }
    }

    fn invalidate(&mut self, key: TextKey) {
        self.entries.remove(&key);
        self.next_version += 1;
        self.versions.insert(key, self.next_version);
    }

    fn clear_where<F: Fn(&TextKey) -> bool>(&mut self, matches: F) {
        self.entries.retain(|key, _| !matches(key));
        self.versions.retain(|key, _| !matches(key));
        self.clears += 1;
    }

    /// Inserts unless the key was written or cleared since `stamp`.
    fn promote(&mut self, key: TextKey, text: String, stamp: Stamp) -> bool {
        if self.stamp(&key) != stamp {
            return false;
        }
        self.entries.insert(key, text);
        true
    }
}

// == Fast Text Cache ==
/// Disk-backed text cache with a memory tier.
///
/// Writes go to disk and drop any memory copy. A read racing a write never
/// promotes the text it read, so memory never serves text older than the
/// disk's.
pub struct FastTextCache {
    disk: DiskTextZipCache,
    memory: RwLock<MemoryTier>,
    probe: Box<dyn MemoryProbe>,
    /// Text is admitted to memory only while more than this fraction is free
    min_free_fraction: f64,
    stats: TextCacheStats,
}

impl FastTextCache {
    // == Constructor ==
    /// Opens a fast cache over a disk cache at `root`, probing system memory.
    pub fn new(root: impl Into<PathBuf>, min_free_fraction: f64) -> Result<Self> {
        Ok(Self::with_probe(
            DiskTextZipCache::new(root)?,
            Box::new(SystemMemoryProbe::new()),
            min_free_fraction,
        ))
    }

    pub fn with_probe(disk: DiskTextZipCache, probe: Box<dyn MemoryProbe>, min_free_fraction: f64) -> Self {
        Self {
            disk,
            memory: RwLock::new(MemoryTier::default()),
            probe,
            min_free_fraction,
            stats: TextCacheStats::new(),
        }
    }

    pub fn disk(&self) -> &DiskTextZipCache {
        &self.disk
    }

    /// Number of entries held in memory.
    pub fn memory_len(&self) -> usize {
        self.memory.read().entries.len()
    }

    fn admits_to_memory(&self) -> bool {
        self.probe.free_fraction() > self.min_free_fraction
    }

    pub fn age(&self, text_type: &str, id: &str) -> Result<Option<Duration>> {
        self.disk.age(text_type, id)
    }

    pub fn remove(&self, text_type: &str, id: &str) -> Result<bool> {
        let removed = self.disk.remove(text_type, id)?;
        self.memory
            .write()
            .invalidate((text_type.to_string(), id.to_string()));
        Ok(removed)
    }

    /// Clears a text type from both tiers.
    pub fn clear(&self, text_type: &str) -> Result<usize> {
        let removed = self.disk.clear(text_type)?;
        self.memory.write().clear_where(|(t, _)| t == text_type);
        Ok(removed)
    }

    /// Clears everything from both tiers.
    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.disk.clear_all()?;
        self.memory.write().clear_where(|_| true);
        Ok(removed)
    }
}

impl TextCache for FastTextCache {
    fn primitive_get(&self, text_type: &str, id: &str) -> Result<Option<String>> {
        let key = (text_type.to_string(), id.to_string());
        let stamp = {
            let memory = self.memory.read();
            if let Some(text) = memory.entries.get(&key) {
                return Ok(Some(text.clone()));
            }
            memory.stamp(&key)
        };

        let found = self.disk.primitive_get(text_type, id)?;
        if let Some(text) = &found {
            if !self.admits_to_memory() {
                debug!("Memory low, not promoting {}/{}", text_type, id);
            } else if !self.memory.write().promote(key, text.clone(), stamp) {
                debug!("{}/{} changed during read, not promoting", text_type, id);
            }
        }
        Ok(found)
    }

    fn primitive_put(&self, text_type: &str, id: &str, contents: &str) -> Result<()> {
        let written = self.disk.primitive_put(text_type, id, contents);
        // Invalidate even on failure: the disk entry may be gone or replaced
        self.memory
            .write()
            .invalidate((text_type.to_string(), id.to_string()));
        written
    }

    fn stats(&self) -> &TextCacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};

    struct SharedProbe(Arc<FixedMemoryProbe>);

    impl MemoryProbe for SharedProbe {
        fn free_fraction(&self) -> f64 {
            self.0.free_fraction()
        }
    }

    fn cache(free: f64) -> (FastTextCache, Arc<FixedMemoryProbe>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let probe = Arc::new(FixedMemoryProbe::new(free));
        let cache = FastTextCache::with_probe(
            DiskTextZipCache::new(dir.path()).unwrap(),
            Box::new(SharedProbe(probe.clone())),
            0.5,
        );
        (cache, probe, dir)
    }

    #[test]
    fn test_put_goes_to_disk_not_memory() {
        let (cache, _, _dir) = cache(0.9);
        cache.put("genes", "1", "Pax6").unwrap();

        assert_eq!(cache.memory_len(), 0);
        assert!(cache.disk().root().join("genes").join("1").exists());
    }

    #[test]
    fn test_read_promotes_to_memory() {
        let (cache, _, _dir) = cache(0.9);
        cache.put("genes", "1", "Pax6").unwrap();

        assert_eq!(cache.get("genes", "1").unwrap(), Some("Pax6".to_string()));
        assert_eq!(cache.memory_len(), 1);

        // Served from memory even after the file is gone
        fs_remove(&cache, "genes", "1");
        assert_eq!(cache.get("genes", "1").unwrap(), Some("Pax6".to_string()));
        assert_eq!(cache.hits("genes"), 2);
    }

    fn fs_remove(cache: &FastTextCache, text_type: &str, id: &str) {
        std::fs::remove_file(cache.disk().root().join(text_type).join(id)).unwrap();
    }

    #[test]
    fn test_low_memory_skips_promotion() {
        let (cache, probe, _dir) = cache(0.5);
        cache.put("genes", "1", "Pax6").unwrap();

        assert!(cache.get("genes", "1").unwrap().is_some());
        assert_eq!(cache.memory_len(), 0, "Exactly half free is not enough");

        probe.set(0.75);
        assert!(cache.get("genes", "1").unwrap().is_some());
        assert_eq!(cache.memory_len(), 1);
    }

    #[test]
    fn test_put_invalidates_memory_copy() {
        let (cache, _, _dir) = cache(0.9);
        cache.put("genes", "1", "old").unwrap();
        cache.get("genes", "1").unwrap();
        assert_eq!(cache.memory_len(), 1);

        cache.put("genes", "1", "new").unwrap();
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("genes", "1").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_miss_accounting() {
        let (cache, _, _dir) = cache(0.9);
        assert_eq!(cache.get("genes", "nope").unwrap(), None);
        assert_eq!(cache.misses("genes"), 1);
        assert_eq!(cache.hit_rate("genes"), 0.0);
        // The disk tier's own counters are not touched
        assert_eq!(cache.disk().total_misses(), 0);
    }

    #[test]
    fn test_clear_drops_both_tiers() {
        let (cache, _, _dir) = cache(0.9);
        cache.put("genes", "1", "a").unwrap();
        cache.put("alleles", "1", "b").unwrap();
        cache.get("genes", "1").unwrap();
        cache.get("alleles", "1").unwrap();

        assert_eq!(cache.clear("genes").unwrap(), 1);
        assert_eq!(cache.memory_len(), 1);
        assert_eq!(cache.get("genes", "1").unwrap(), None);

        assert_eq!(cache.clear_all().unwrap(), 1);
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("alleles", "1").unwrap(), None);
    }

    #[test]
    fn test_remove_drops_both_tiers() {
        let (cache, _, _dir) = cache(0.9);
        cache.put("genes", "1", "a").unwrap();
        cache.get("genes", "1").unwrap();

        assert!(cache.remove("genes", "1").unwrap());
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("genes", "1").unwrap(), None);
    }

    /// Blocks the first reader between its disk read and its promotion.
    struct PausingProbe {
        reached: Mutex<Option<mpsc::Sender<()>>>,
        resume: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl MemoryProbe for PausingProbe {
        fn free_fraction(&self) -> f64 {
            let reached = self.reached.lock().take();
            if let Some(reached) = reached {
                reached.send(()).unwrap();
                let resume = self.resume.lock().take().unwrap();
                resume.recv().unwrap();
            }
            0.9
        }
    }

    #[test]
    fn test_put_during_read_is_not_shadowed_by_old_text() {
        let dir = tempfile::tempdir().unwrap();
        let (reached_tx, reached_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let probe = PausingProbe {
            reached: Mutex::new(Some(reached_tx)),
            resume: Mutex::new(Some(resume_rx)),
        };
        let cache = Arc::new(FastTextCache::with_probe(
            DiskTextZipCache::new(dir.path()).unwrap(),
            Box::new(probe),
            0.5,
        ));
        cache.put("genes", "1", "old").unwrap();

        let reader = {
            let cache = cache.clone();
            std::thread::spawn(move || cache.get("genes", "1").unwrap())
        };

        // The reader has read "old" from disk and not yet promoted it
        reached_rx.recv().unwrap();
        cache.put("genes", "1", "new").unwrap();
        resume_tx.send(()).unwrap();

        assert_eq!(reader.join().unwrap(), Some("old".to_string()));
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("genes", "1").unwrap(), Some("new".to_string()));
        assert_eq!(cache.get("genes", "1").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_clear_during_read_is_not_shadowed_by_old_text() {
        let dir = tempfile::tempdir().unwrap();
        let (reached_tx, reached_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let cache = Arc::new(FastTextCache::with_probe(
            DiskTextZipCache::new(dir.path()).unwrap(),
            Box::new(PausingProbe {
                reached: Mutex::new(Some(reached_tx)),
                resume: Mutex::new(Some(resume_rx)),
            }),
            0.5,
        ));
        cache.put("genes", "1", "old").unwrap();

        let reader = {
            let cache = cache.clone();
            std::thread::spawn(move || cache.get("genes", "1").unwrap())
        };

        reached_rx.recv().unwrap();
        cache.clear("genes").unwrap();
        resume_tx.send(()).unwrap();

        reader.join().unwrap();
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("genes", "1").unwrap(), None);
    }

    #[test]
    fn test_system_probe_in_range() {
        let fraction = SystemMemoryProbe::new().free_fraction();
        assert!((0.0..=1.0).contains(&fraction));
    }
}
