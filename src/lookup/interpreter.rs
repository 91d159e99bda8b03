//! Row Interpreter Module
//!
//! Turns result rows into cache entries, either one row per entry or one
//! group of consecutive rows per entry.

use crate::db::Row;
use crate::error::Result;
use crate::lookup::{CacheKey, KeyValue};

// == Row Interpreter ==
/// Interprets a single row as one cache entry.
///
/// Returning `Ok(None)` means the row did not produce a key/value pair,
/// which fails population with `CacheError::MissingKeyValue`.
pub trait RowInterpreter<V>: Send + Sync {
    fn interpret(&self, row: &Row) -> Result<Option<KeyValue<V>>>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<V, F> RowInterpreter<V> for F
where
    F: Fn(&Row) -> Result<Option<KeyValue<V>>> + Send + Sync,
{
    fn interpret(&self, row: &Row) -> Result<Option<KeyValue<V>>> {
        self(row)
    }
}

// == Multi Row Interpreter ==
/// Interprets runs of consecutive rows sharing a group key as one entry.
///
/// Rows must arrive ordered by group key; a key that reappears after a
/// different one starts a new group.
pub trait MultiRowInterpreter<V>: Send + Sync {
    /// The key that decides which group a row belongs to.
    fn interpret_key(&self, row: &Row) -> Result<CacheKey>;

    /// Combines one group, in row order, into a single entry.
    fn interpret_rows(&self, rows: &[Row]) -> Result<Option<KeyValue<V>>>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// == Interpreter ==
/// The interpretation capability a lookup source hands to the cache.
pub enum Interpreter<V> {
    /// One entry per row
    Row(Box<dyn RowInterpreter<V>>),
    /// One entry per group of consecutive rows
    MultiRow(Box<dyn MultiRowInterpreter<V>>),
}

impl<V> Interpreter<V> {
    pub fn row(interpreter: impl RowInterpreter<V> + 'static) -> Self {
        Interpreter::Row(Box::new(interpreter))
    }

    pub fn multi_row(interpreter: impl MultiRowInterpreter<V> + 'static) -> Self {
        Interpreter::MultiRow(Box::new(interpreter))
    }

    pub fn name(&self) -> &str {
        match self {
            Interpreter::Row(i) => i.name(),
            Interpreter::MultiRow(i) => i.name(),
        }
    }

    pub fn is_multi_row(&self) -> bool {
        matches!(self, Interpreter::MultiRow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    struct SymbolInterpreter;

    impl RowInterpreter<String> for SymbolInterpreter {
        fn interpret(&self, row: &Row) -> Result<Option<KeyValue<String>>> {
            Ok(Some(KeyValue::new(
                row.get_int(1)?,
                row.get_string(2)?.unwrap_or_default(),
            )))
        }
    }

    #[test]
    fn test_name_is_type_name() {
        let interpreter = Interpreter::row(SymbolInterpreter);
        assert!(interpreter.name().ends_with("SymbolInterpreter"));
        assert!(!interpreter.is_multi_row());
    }

    #[test]
    fn test_closure_interpreter() {
        let interpreter = |row: &Row| -> Result<Option<KeyValue<i64>>> {
            Ok(Some(KeyValue::new(row.get_string(1)?, row.get_int(2)?)))
        };
        let row = Row::new(vec![Value::from("a"), Value::from(5)]);
        let kv = interpreter.interpret(&row).unwrap().unwrap();
        assert_eq!(kv.value(), &5);
    }
}
