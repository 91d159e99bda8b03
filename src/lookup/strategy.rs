//! Cache Strategy Module
//!
//! Policies deciding when and how a row-data cache is populated.
//!
//! A strategy moves from uninitialized to initialized exactly once. The
//! transition is recorded before population starts, so a failed load is
//! not retried on the next call.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::QueryExecutor;
use crate::error::{CacheError, Result};
use crate::lookup::helper::populate;
use crate::lookup::{CacheKey, CacheMap, FullPopulated, LazyPopulated, LookupSource};

// == Cache Type ==
/// Which population policy a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Optional seed query, then one add query per missing key
    Lazy,
    /// One query loads everything; lookups never query again
    Full,
}

// == Init Once ==
/// One-shot initialization guard.
///
/// Concurrent first callers serialize on the lock: the first runs the
/// initializer, the rest wait for it and then return without running it.
#[derive(Debug, Default)]
pub struct InitOnce {
    started: AtomicBool,
    finished: AtomicBool,
    lock: Mutex<()>,
}

impl InitOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once initialization has begun, even if it failed.
    pub fn is_set(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Runs `init` if no call has run it before. Returns whether it ran.
    ///
    /// The lock is not reentrant: `init` must not call `run` or `rerun` on
    /// the same guard.
    pub fn run<F>(&self, init: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        if self.finished.load(Ordering::Acquire) {
            return Ok(false);
        }
        let _guard = self.lock.lock();
        if self.started.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.started.store(true, Ordering::Release);
        let result = init();
        self.finished.store(true, Ordering::Release);
        result.map(|_| true)
    }

    /// Runs `init` unconditionally, serialized with `run`.
    pub fn rerun<F>(&self, init: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let _guard = self.lock.lock();
        self.started.store(true, Ordering::Release);
        let result = init();
        self.finished.store(true, Ordering::Release);
        result
    }
}

// == Cache Context ==
/// What a strategy needs from its handler to load entries.
pub struct CacheContext<'a, S: LookupSource> {
    pub source: &'a S,
    pub executor: &'a dyn QueryExecutor,
    pub cache: &'a CacheMap<S::Value>,
}

impl<'a, S: LookupSource> CacheContext<'a, S> {
    /// Runs `sql` and drains its rows into the cache.
    pub fn load(&self, sql: &str) -> Result<usize> {
        let cursor = self.executor.execute(sql)?;
        populate(cursor, &self.source.row_interpreter(), self.cache)
    }

    /// Brackets `body` with the source's pre/post initialization hooks.
    pub fn with_hooks<F>(&self, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        self.source
            .run_pre_init()
            .map_err(|e| initialization_error(self.source, e))?;
        body()?;
        self.source
            .run_post_init()
            .map_err(|e| initialization_error(self.source, e))
    }
}

fn initialization_error<S: LookupSource>(source: &S, err: CacheError) -> CacheError {
    CacheError::Initialization {
        handler: source.name().to_string(),
        message: err.to_string(),
    }
}

// == Strategy Trait ==
/// Population policy for a row-data cache.
pub trait RowDataCacheStrategy<S: LookupSource>: Send + Sync {
    fn cache_type(&self) -> CacheType;

    /// True once `init` has started.
    fn is_initialized(&self) -> bool;

    /// Populates the cache according to the policy, at most once.
    fn init(&self, ctx: &CacheContext<'_, S>) -> Result<()>;

    /// Returns the value for `key`, initializing first if needed.
    fn lookup(&self, key: &CacheKey, ctx: &CacheContext<'_, S>) -> Result<Option<S::Value>>;

    /// Clears the cache and runs the initial load again.
    fn refresh(&self, ctx: &CacheContext<'_, S>) -> Result<()>;
}

// == Full Cache Strategy ==
/// Loads every entry with one query; lookups are pure map reads afterwards.
#[derive(Debug, Default)]
pub struct FullCacheStrategy {
    once: InitOnce,
}

impl FullCacheStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn load_all<S: FullPopulated>(ctx: &CacheContext<'_, S>) -> Result<()> {
        ctx.with_hooks(|| {
            let sql = ctx.source.full_init_query().ok_or_else(|| {
                CacheError::Configuration(format!(
                    "{} has no full initialization query",
                    ctx.source.name()
                ))
            })?;
            let count = ctx.load(&sql)?;
            info!("Fully cached {} entries for {}", count, ctx.source.name());
            Ok(())
        })
    }
}

impl<S: FullPopulated> RowDataCacheStrategy<S> for FullCacheStrategy {
    fn cache_type(&self) -> CacheType {
        CacheType::Full
    }

    fn is_initialized(&self) -> bool {
        self.once.is_set()
    }

    fn init(&self, ctx: &CacheContext<'_, S>) -> Result<()> {
        self.once.run(|| Self::load_all(ctx)).map(|_| ())
    }

    fn lookup(&self, key: &CacheKey, ctx: &CacheContext<'_, S>) -> Result<Option<S::Value>> {
        self.init(ctx)?;
        Ok(ctx.cache.get(key))
    }

    fn refresh(&self, ctx: &CacheContext<'_, S>) -> Result<()> {
        self.once.rerun(|| {
            ctx.cache.clear();
            Self::load_all(ctx)
        })
    }
}

// == Lazy Cache Strategy ==
/// Starts from an optional seed and fetches missing keys one at a time.
///
/// Keys the database does not know are not remembered: every lookup of an
/// absent key issues its add query again.
#[derive(Debug, Default)]
pub struct LazyCacheStrategy {
    once: InitOnce,
}

impl LazyCacheStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn seed<S: LazyPopulated>(ctx: &CacheContext<'_, S>) -> Result<()> {
        ctx.with_hooks(|| match ctx.source.partial_init_query() {
            Some(sql) => {
                let count = ctx.load(&sql)?;
                info!("Seeded {} entries for {}", count, ctx.source.name());
                Ok(())
            }
            None => {
                debug!("No seed query for {}, starting empty", ctx.source.name());
                Ok(())
            }
        })
    }
}

impl<S: LazyPopulated> RowDataCacheStrategy<S> for LazyCacheStrategy {
    fn cache_type(&self) -> CacheType {
        CacheType::Lazy
    }

    fn is_initialized(&self) -> bool {
        self.once.is_set()
    }

    fn init(&self, ctx: &CacheContext<'_, S>) -> Result<()> {
        self.once.run(|| Self::seed(ctx)).map(|_| ())
    }

    fn lookup(&self, key: &CacheKey, ctx: &CacheContext<'_, S>) -> Result<Option<S::Value>> {
        self.init(ctx)?;
        if let Some(value) = ctx.cache.get(key) {
            return Ok(Some(value));
        }

        let sql = ctx.source.add_query(key);
        let added = ctx.load(&sql)?;
        debug!(
            "Cache miss for {} in {}: add query returned {} entries",
            key,
            ctx.source.name(),
            added
        );
        Ok(ctx.cache.get(key))
    }

    fn refresh(&self, ctx: &CacheContext<'_, S>) -> Result<()> {
        self.once.rerun(|| {
            ctx.cache.clear();
            Self::seed(ctx)
        })
    }
}
