//! Cached Lookup Module
//!
//! Typed lookup-or-fail and lookup-or-none access on top of a handler.

use std::ops::Deref;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::error::{CacheError, Result};
use crate::lookup::{CacheKey, FullPopulated, LazyPopulated, LookupSource, RowDataCacheHandler};

// == Cached Lookup ==
/// Convenience wrapper turning "no value" into a typed outcome.
pub struct CachedLookup<S: LookupSource> {
    handler: RowDataCacheHandler<S>,
}

impl<S: LookupSource + 'static> CachedLookup<S> {
    pub fn new(handler: RowDataCacheHandler<S>) -> Self {
        Self { handler }
    }

    // == Lookup ==
    /// Returns the value for `key`.
    ///
    /// A null key or a key with no value fails with `KeyNotFound`, carrying
    /// the key and the lookup's name.
    pub fn lookup(&self, key: impl Into<CacheKey>) -> Result<S::Value> {
        let key = key.into();
        if key.is_null() {
            return Err(self.not_found(&key));
        }
        self.handler
            .lookup(&key)?
            .ok_or_else(|| self.not_found(&key))
    }

    // == Lookup Nulls Ok ==
    /// Like `lookup`, but a missing value (or a null key) is `Ok(None)`.
    pub fn lookup_nulls_ok(&self, key: impl Into<CacheKey>) -> Result<Option<S::Value>> {
        let key = key.into();
        if key.is_null() {
            return Ok(None);
        }
        self.handler.lookup(&key)
    }

    pub fn handler(&self) -> &RowDataCacheHandler<S> {
        &self.handler
    }

    fn not_found(&self, key: &CacheKey) -> CacheError {
        CacheError::KeyNotFound {
            key: key.to_string(),
            lookup: self.handler.source().name().to_string(),
        }
    }
}

impl<S: LookupSource> Deref for CachedLookup<S> {
    type Target = RowDataCacheHandler<S>;

    fn deref(&self) -> &Self::Target {
        &self.handler
    }
}

// == Full Cached Lookup ==
/// A cached lookup whose table is loaded in full on first use.
pub struct FullCachedLookup<S: LookupSource> {
    inner: CachedLookup<S>,
}

impl<S: FullPopulated + 'static> FullCachedLookup<S> {
    pub fn new(source: S, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            inner: CachedLookup::new(RowDataCacheHandler::full(source, executor)),
        }
    }
}

impl<S: LookupSource> Deref for FullCachedLookup<S> {
    type Target = CachedLookup<S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

// == Lazy Cached Lookup ==
/// A cached lookup that fetches entries as they are asked for.
pub struct LazyCachedLookup<S: LookupSource> {
    inner: CachedLookup<S>,
}

impl<S: LazyPopulated + 'static> LazyCachedLookup<S> {
    pub fn new(source: S, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            inner: CachedLookup::new(RowDataCacheHandler::lazy(source, executor)),
        }
    }
}

impl<S: LookupSource> Deref for LazyCachedLookup<S> {
    type Target = CachedLookup<S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Row, SqliteExecutor};
    use crate::lookup::{CacheType, Interpreter, KeyValue, MultiRowInterpreter, RowInterpreter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SETUP: &str = "
        CREATE TABLE term (term_key INTEGER, term TEXT);
        INSERT INTO term VALUES (1, 'value 1'), (2, 'VAluE 3'), (3, 'Gene');
        CREATE TABLE synonym (term_key INTEGER, seq INTEGER, synonym TEXT);
        INSERT INTO synonym VALUES
            (1, 1, 'one'), (1, 2, 'two'), (1, 3, 'three'),
            (2, 1, 'one'), (2, 2, 'two');
    ";

    fn executor() -> Arc<SqliteExecutor> {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.execute_batch(SETUP).unwrap();
        Arc::new(db)
    }

    struct TermInterpreter;

    impl RowInterpreter<i64> for TermInterpreter {
        fn interpret(&self, row: &Row) -> Result<Option<KeyValue<i64>>> {
            Ok(Some(KeyValue::new(row.get_string(2)?, row.get_int(1)?)))
        }
    }

    /// Term text -> term key, loaded in full.
    struct TermKeyLookup;

    impl LookupSource for TermKeyLookup {
        type Value = i64;

        fn row_interpreter(&self) -> Interpreter<i64> {
            Interpreter::row(TermInterpreter)
        }
    }

    impl FullPopulated for TermKeyLookup {
        fn full_init_query(&self) -> Option<String> {
            Some("SELECT term_key, term FROM term".to_string())
        }
    }

    /// Term text -> term key, fetched per key.
    #[derive(Default)]
    struct LazyTermKeyLookup {
        seed: Option<String>,
        pre_init_calls: AtomicUsize,
        post_init_calls: AtomicUsize,
    }

    impl LookupSource for LazyTermKeyLookup {
        type Value = i64;

        fn row_interpreter(&self) -> Interpreter<i64> {
            Interpreter::row(TermInterpreter)
        }

        fn run_pre_init(&self) -> Result<()> {
            self.pre_init_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn run_post_init(&self) -> Result<()> {
            self.post_init_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl LazyPopulated for LazyTermKeyLookup {
        fn partial_init_query(&self) -> Option<String> {
            self.seed.clone()
        }

        fn add_query(&self, key: &CacheKey) -> String {
            format!(
                "SELECT term_key, term FROM term WHERE lower(term) = lower('{}')",
                key
            )
        }
    }

    /// Term key -> colon-joined synonyms, grouped over several rows.
    struct SynonymLookup;

    struct SynonymJoiner;

    impl MultiRowInterpreter<String> for SynonymJoiner {
        fn interpret_key(&self, row: &Row) -> Result<CacheKey> {
            Ok(CacheKey::from(row.get_int(1)?))
        }

        fn interpret_rows(&self, rows: &[Row]) -> Result<Option<KeyValue<String>>> {
            let synonyms = rows
                .iter()
                .map(|r| r.get_string(2).map(Option::unwrap_or_default))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(KeyValue::new(rows[0].get_int(1)?, synonyms.join(":"))))
        }
    }

    impl LookupSource for SynonymLookup {
        type Value = String;

        fn row_interpreter(&self) -> Interpreter<String> {
            Interpreter::multi_row(SynonymJoiner)
        }
    }

    impl FullPopulated for SynonymLookup {
        fn full_init_query(&self) -> Option<String> {
            Some("SELECT term_key, synonym FROM synonym ORDER BY term_key, seq".to_string())
        }
    }

    #[test]
    fn test_full_lookup_issues_one_query() {
        let db = executor();
        let lookup = FullCachedLookup::new(TermKeyLookup, db.clone());

        for _ in 0..50 {
            assert_eq!(lookup.lookup("Gene").unwrap(), 3);
        }
        assert!(lookup.lookup_nulls_ok("absent").unwrap().is_none());

        assert_eq!(db.queries_executed(), 1);
        assert_eq!(lookup.cache_size(), 3);
        assert_eq!(lookup.cache_type(), CacheType::Full);
    }

    #[test]
    fn test_full_lookup_concurrent_first_access() {
        let db = executor();
        let lookup = Arc::new(FullCachedLookup::new(TermKeyLookup, db.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lookup = lookup.clone();
                std::thread::spawn(move || lookup.lookup("value 1").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(db.queries_executed(), 1);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let lookup = FullCachedLookup::new(TermKeyLookup, executor());
        assert_eq!(lookup.lookup("value 3").unwrap(), 2);
        assert_eq!(lookup.lookup("VALUE 3").unwrap(), 2);
        assert_eq!(lookup.lookup("VAluE 3").unwrap(), 2);
    }

    #[test]
    fn test_lookup_missing_key_carries_key_and_lookup_name() {
        let lookup = FullCachedLookup::new(TermKeyLookup, executor());
        match lookup.lookup("nope").unwrap_err() {
            CacheError::KeyNotFound { key, lookup } => {
                assert_eq!(key, "nope");
                assert!(lookup.ends_with("TermKeyLookup"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_key() {
        let lookup = FullCachedLookup::new(TermKeyLookup, executor());
        assert!(matches!(
            lookup.lookup(None::<&str>),
            Err(CacheError::KeyNotFound { .. })
        ));
        assert_eq!(lookup.lookup_nulls_ok(None::<&str>).unwrap(), None);
    }

    #[test]
    fn test_lazy_miss_round_trip() {
        let db = executor();
        let lookup = LazyCachedLookup::new(LazyTermKeyLookup::default(), db.clone());

        assert_eq!(lookup.cache_size(), 0);
        assert_eq!(lookup.lookup("Gene").unwrap(), 3);
        assert_eq!(lookup.cache_size(), 1);
        assert!(lookup.handler().snapshot().iter().any(|(k, _)| *k == CacheKey::from("gene")));

        // Served from the map now
        assert_eq!(lookup.lookup("GENE").unwrap(), 3);
        assert_eq!(db.queries_executed(), 1);
    }

    #[test]
    fn test_lazy_absent_key_is_not_cached() {
        let db = executor();
        let lookup = LazyCachedLookup::new(LazyTermKeyLookup::default(), db.clone());

        assert_eq!(lookup.lookup_nulls_ok("missing").unwrap(), None);
        assert_eq!(lookup.lookup_nulls_ok("missing").unwrap(), None);
        assert_eq!(lookup.cache_size(), 0);
        // Every miss goes back to the database
        assert_eq!(db.queries_executed(), 2);
    }

    #[test]
    fn test_lazy_seed_query() {
        let db = executor();
        let source = LazyTermKeyLookup {
            seed: Some("SELECT term_key, term FROM term WHERE term_key < 3".to_string()),
            ..Default::default()
        };
        let lookup = LazyCachedLookup::new(source, db.clone());

        lookup.init_cache().unwrap();
        assert_eq!(lookup.cache_size(), 2);
        assert_eq!(lookup.lookup("value 1").unwrap(), 1);
        assert_eq!(db.queries_executed(), 1);

        assert_eq!(lookup.lookup("gene").unwrap(), 3);
        assert_eq!(db.queries_executed(), 2);
    }

    #[test]
    fn test_hooks_bracket_initialization_once() {
        let lookup = LazyCachedLookup::new(LazyTermKeyLookup::default(), executor());
        lookup.lookup_nulls_ok("gene").unwrap();
        lookup.lookup_nulls_ok("gene").unwrap();
        lookup.init_cache().unwrap();

        let source = lookup.handler().source();
        assert_eq!(source.pre_init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.post_init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_hook_is_initialization_error() {
        struct BadSetup;
        impl LookupSource for BadSetup {
            type Value = i64;
            fn row_interpreter(&self) -> Interpreter<i64> {
                Interpreter::row(TermInterpreter)
            }
            fn run_pre_init(&self) -> Result<()> {
                Err(CacheError::Configuration("temp table exists".to_string()))
            }
        }
        impl FullPopulated for BadSetup {
            fn full_init_query(&self) -> Option<String> {
                Some("SELECT term_key, term FROM term".to_string())
            }
        }

        let db = executor();
        let lookup = FullCachedLookup::new(BadSetup, db.clone());
        match lookup.lookup("gene").unwrap_err() {
            CacheError::Initialization { message, .. } => {
                assert!(message.contains("temp table exists"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(db.queries_executed(), 0);
    }

    #[test]
    fn test_multi_row_aggregation() {
        let lookup = FullCachedLookup::new(SynonymLookup, executor());
        assert_eq!(lookup.lookup(1).unwrap(), "one:two:three");
        assert_eq!(lookup.lookup(2).unwrap(), "one:two");
        assert_eq!(lookup.cache_size(), 2);
    }

    #[test]
    fn test_non_key_value_interpreter_rejected() {
        struct NoEntries;
        impl RowInterpreter<i64> for NoEntries {
            fn interpret(&self, _row: &Row) -> Result<Option<KeyValue<i64>>> {
                Ok(None)
            }
        }
        struct Misconfigured;
        impl LookupSource for Misconfigured {
            type Value = i64;
            fn row_interpreter(&self) -> Interpreter<i64> {
                Interpreter::row(NoEntries)
            }
        }
        impl FullPopulated for Misconfigured {
            fn full_init_query(&self) -> Option<String> {
                Some("SELECT term_key, term FROM term".to_string())
            }
        }

        let lookup = FullCachedLookup::new(Misconfigured, executor());
        match lookup.lookup_nulls_ok("gene").unwrap_err() {
            CacheError::MissingKeyValue { interpreter } => {
                assert!(interpreter.ends_with("NoEntries"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(lookup.cache_size(), 0);
    }

    #[test]
    fn test_refresh_reloads() {
        let db = executor();
        let lookup = FullCachedLookup::new(TermKeyLookup, db.clone());
        assert_eq!(lookup.lookup("gene").unwrap(), 3);

        db.execute_batch("UPDATE term SET term_key = 30 WHERE term = 'Gene'")
            .unwrap();
        assert_eq!(lookup.lookup("gene").unwrap(), 3);

        lookup.refresh().unwrap();
        assert_eq!(lookup.lookup("gene").unwrap(), 30);
        assert_eq!(db.queries_executed(), 2);
    }

    #[test]
    fn test_database_error_propagates() {
        struct BadTable;
        impl LookupSource for BadTable {
            type Value = i64;
            fn row_interpreter(&self) -> Interpreter<i64> {
                Interpreter::row(TermInterpreter)
            }
        }
        impl LazyPopulated for BadTable {
            fn add_query(&self, key: &CacheKey) -> String {
                format!("SELECT * FROM missing_table WHERE k = '{}'", key)
            }
        }

        let lookup = LazyCachedLookup::new(BadTable, executor());
        match lookup.lookup("abc").unwrap_err() {
            CacheError::Database { sql, .. } => assert!(sql.contains("'abc'")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
