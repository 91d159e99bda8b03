//! Cache Registry
//!
//! The process-wide caches, built once at startup and handed to every
//! consumer by reference instead of living in statics.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::expiring::{ExpiringObjectCache, SystemClock};
use crate::text::FastTextCache;

/// Shared expiring object cache keyed and valued by strings.
pub type SharedObjectCache = ExpiringObjectCache<String, String>;

// == Cache Registry ==
/// Long-lived handles to the shared caches. Cloning shares the caches.
#[derive(Clone)]
pub struct CacheRegistry {
    objects: Arc<SharedObjectCache>,
    texts: Arc<FastTextCache>,
}

impl CacheRegistry {
    pub fn new(objects: SharedObjectCache, texts: FastTextCache) -> Self {
        Self {
            objects: Arc::new(objects),
            texts: Arc::new(texts),
        }
    }

    /// Builds the shared caches from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let objects = ExpiringObjectCache::with_clock(
            config.default_lifetime,
            config.sweep_every,
            Arc::new(SystemClock),
        );
        let texts = FastTextCache::new(&config.text_cache_dir, config.memory_free_ratio)?;
        info!(
            "Cache registry ready: lifetime={}s, sweep every {} gets, text root {}",
            config.default_lifetime,
            config.sweep_every,
            config.text_cache_dir.display()
        );
        Ok(Self::new(objects, texts))
    }

    /// The shared expiring object cache.
    pub fn objects(&self) -> &Arc<SharedObjectCache> {
        &self.objects
    }

    /// The shared text cache.
    pub fn texts(&self) -> &Arc<FastTextCache> {
        &self.texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextCache;

    #[test]
    fn test_clones_share_caches() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            text_cache_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let registry = CacheRegistry::from_config(&config).unwrap();
        let other = registry.clone();

        registry.objects().put("k".to_string(), "v".to_string());
        assert_eq!(other.objects().get(&"k".to_string()), Some("v".to_string()));

        registry.texts().put("genes", "1", "Pax6").unwrap();
        assert_eq!(other.texts().get("genes", "1").unwrap(), Some("Pax6".to_string()));
        assert_eq!(registry.texts().hits("genes"), 1);
    }

    #[test]
    fn test_from_config_uses_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            text_cache_dir: dir.path().join("nested"),
            default_lifetime: 42,
            sweep_every: 7,
            ..Config::default()
        };
        let registry = CacheRegistry::from_config(&config).unwrap();

        assert_eq!(registry.objects().default_lifetime(), 42);
        assert_eq!(registry.objects().sweep_every(), 7);
        assert!(dir.path().join("nested").exists());
    }
}
