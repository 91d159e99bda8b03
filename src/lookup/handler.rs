//! Row Data Cache Handler Module
//!
//! Owns a cache map, the strategy that fills it, and the lookup source that
//! supplies queries and the row interpreter.

use std::fmt::Debug;
use std::io::Write;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::error::{CacheError, Result};
use crate::lookup::{
    CacheContext, CacheKey, CacheMap, CacheType, FullCacheStrategy, Interpreter,
    LazyCacheStrategy, RowDataCacheStrategy,
};

// == Lookup Source ==
/// The part every concrete lookup supplies regardless of strategy.
pub trait LookupSource: Send + Sync {
    /// Type of the cached values.
    type Value: Clone + Send + Sync + 'static;

    /// Interpreter turning result rows into entries.
    ///
    /// During the initial load and `refresh` the interpreter runs with the
    /// initialization lock held, so it must not call `lookup`, `init_cache`
    /// or `refresh` on its own handler: the lock is not reentrant and the
    /// call deadlocks.
    fn row_interpreter(&self) -> Interpreter<Self::Value>;

    /// Runs before the initial load (temp tables and the like).
    ///
    /// Called with the initialization lock held. Calling back into the
    /// owning handler's `lookup`, `init_cache` or `refresh` deadlocks.
    fn run_pre_init(&self) -> Result<()> {
        Ok(())
    }

    /// Runs after a successful initial load.
    ///
    /// Same restriction as `run_pre_init`: no calls back into the owning
    /// handler.
    fn run_post_init(&self) -> Result<()> {
        Ok(())
    }

    /// Name used in log lines and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A source that can load its whole table with one query.
pub trait FullPopulated: LookupSource {
    /// Query loading every entry. `None` is a configuration error at init time.
    fn full_init_query(&self) -> Option<String>;
}

/// A source that loads entries on demand.
pub trait LazyPopulated: LookupSource {
    /// Optional seed query; `None` starts the cache empty.
    fn partial_init_query(&self) -> Option<String> {
        None
    }

    /// Query fetching the entry (or entries) for one missing key.
    fn add_query(&self, key: &CacheKey) -> String;
}

// == Handler ==
/// A row-data cache: map, strategy and lookup source together.
///
/// Which strategy runs is fixed at construction. The capability traits make
/// the pairing checked at compile time: `full` needs a `FullPopulated`
/// source and `lazy` a `LazyPopulated` one.
pub struct RowDataCacheHandler<S: LookupSource> {
    source: S,
    executor: Arc<dyn QueryExecutor>,
    cache: CacheMap<S::Value>,
    strategy: Box<dyn RowDataCacheStrategy<S>>,
}

impl<S: LookupSource + 'static> RowDataCacheHandler<S> {
    /// Creates a handler loading everything on first use.
    pub fn full(source: S, executor: Arc<dyn QueryExecutor>) -> Self
    where
        S: FullPopulated,
    {
        Self::with_strategy(source, executor, Box::new(FullCacheStrategy::new()))
    }

    /// Creates a handler loading entries on demand.
    pub fn lazy(source: S, executor: Arc<dyn QueryExecutor>) -> Self
    where
        S: LazyPopulated,
    {
        Self::with_strategy(source, executor, Box::new(LazyCacheStrategy::new()))
    }

    /// Creates a handler for a source supporting both policies.
    pub fn with_cache_type(source: S, executor: Arc<dyn QueryExecutor>, cache_type: CacheType) -> Self
    where
        S: FullPopulated + LazyPopulated,
    {
        match cache_type {
            CacheType::Full => Self::full(source, executor),
            CacheType::Lazy => Self::lazy(source, executor),
        }
    }

    fn with_strategy(
        source: S,
        executor: Arc<dyn QueryExecutor>,
        strategy: Box<dyn RowDataCacheStrategy<S>>,
    ) -> Self {
        Self {
            source,
            executor,
            cache: CacheMap::new(),
            strategy,
        }
    }

    fn context(&self) -> CacheContext<'_, S> {
        CacheContext {
            source: &self.source,
            executor: self.executor.as_ref(),
            cache: &self.cache,
        }
    }

    // == Init Cache ==
    /// Runs the strategy's initial load unless it already ran.
    pub fn init_cache(&self) -> Result<()> {
        self.strategy.init(&self.context())
    }

    // == Lookup ==
    /// Returns the cached value for `key`, loading per strategy.
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<S::Value>> {
        self.strategy.lookup(key, &self.context())
    }

    // == Refresh ==
    /// Discards the cached entries and loads again.
    pub fn refresh(&self) -> Result<()> {
        self.strategy.refresh(&self.context())
    }

    pub fn cache_type(&self) -> CacheType {
        self.strategy.cache_type()
    }

    pub fn is_initialized(&self) -> bool {
        self.strategy.is_initialized()
    }

    /// Number of cached entries.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Copy of the cached entries ordered by key.
    pub fn snapshot(&self) -> Vec<(CacheKey, S::Value)> {
        self.cache.snapshot()
    }

    // == Print Cache ==
    /// Writes every entry to `sink`, one `key: value` line each.
    pub fn print_cache(&self, sink: &mut dyn Write) -> Result<()>
    where
        S::Value: Debug,
    {
        writeln!(
            sink,
            "{} ({:?}, {} entries)",
            self.source.name(),
            self.cache_type(),
            self.cache_size()
        )
        .map_err(CacheError::Sink)?;
        for (key, value) in self.snapshot() {
            writeln!(sink, "{}: {:?}", key, value).map_err(CacheError::Sink)?;
        }
        sink.flush().map_err(CacheError::Sink)
    }
}
