//! SQLite Query Service
//!
//! A `QueryExecutor` backed by a single rusqlite connection.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::db::{QueryExecutor, Row, RowCursor, Value, VecCursor};
use crate::error::{CacheError, Result};

// == Sqlite Executor ==
/// Runs queries against one SQLite connection.
///
/// The connection sits behind a mutex, so queries from several threads are
/// serialized. Results are materialized before the lock is released.
pub struct SqliteExecutor {
    connection: Mutex<Connection>,
    queries: AtomicU64,
}

impl SqliteExecutor {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|e| CacheError::Database {
            sql: format!("open {}", path.display()),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(connection))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(|e| CacheError::Database {
            sql: "open :memory:".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
            queries: AtomicU64::new(0),
        }
    }

    /// Runs one or more statements that return no rows (schema setup, loads).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection
            .lock()
            .execute_batch(sql)
            .map_err(|e| database_error(sql, e))
    }

    /// Number of `execute` calls made so far.
    pub fn queries_executed(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        debug!("Executing query: {}", sql);

        let connection = self.connection.lock();
        let mut stmt = connection.prepare(sql).map_err(|e| database_error(sql, e))?;
        let columns = stmt.column_count();
        let mut rows = stmt.query([]).map_err(|e| database_error(sql, e))?;

        let mut collected = Vec::new();
        while let Some(row) = rows.next().map_err(|e| database_error(sql, e))? {
            let mut values = Vec::with_capacity(columns);
            for i in 0..columns {
                let value = row.get_ref(i).map_err(|e| database_error(sql, e))?;
                values.push(convert(value));
            }
            collected.push(Row::new(values));
        }

        debug!("Query returned {} rows", collected.len());
        Ok(Box::new(VecCursor::new(collected)))
    }
}

fn convert(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn database_error(sql: &str, err: rusqlite::Error) -> CacheError {
    CacheError::Database {
        sql: sql.to_string(),
        message: err.to_string(),
    }
}
