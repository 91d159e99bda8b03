//! Query Service Module
//!
//! The narrow seam the caches use to reach a relational database: a query
//! string goes in, a forward-only cursor of rows comes out.

mod cursor;
mod row;
mod sqlite;

pub use cursor::{RowCursor, VecCursor};
pub use row::{Row, Value};
pub use sqlite::SqliteExecutor;

use crate::error::Result;

// == Query Executor ==
/// Executes complete query strings and returns their result rows.
///
/// Implementations own connections and transactions; callers only ever hand
/// over a finished SQL string and iterate the cursor.
pub trait QueryExecutor: Send + Sync {
    /// Runs `sql` and returns a cursor over its rows.
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>>;
}
