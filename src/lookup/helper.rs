//! Cache Population Module
//!
//! The one place result rows are translated into cache entries. Both
//! strategies load through `populate`, so key normalization and multi-row
//! grouping behave identically for full loads, seeds and lazy misses.

use tracing::debug;

use crate::db::{Row, RowCursor};
use crate::error::{CacheError, Result};
use crate::lookup::{CacheKey, CacheMap, Interpreter, KeyValue, MultiRowInterpreter};

// == Populate ==
/// Drains `cursor` into `cache` and returns the number of entries written.
///
/// Existing entries under the same normalized key are overwritten. The
/// cursor is closed whether or not interpretation succeeds; entries written
/// before a failure stay in the map.
pub fn populate<V: Clone>(
    mut cursor: Box<dyn RowCursor>,
    interpreter: &Interpreter<V>,
    cache: &CacheMap<V>,
) -> Result<usize> {
    let drained = match interpreter {
        Interpreter::Row(row_interpreter) => {
            let mut count = 0;
            loop {
                let row = match cursor.next_row() {
                    Ok(Some(row)) => row,
                    Ok(None) => break Ok(count),
                    Err(e) => break Err(e),
                };
                if let Err(e) = store(row_interpreter.interpret(&row), interpreter.name(), cache) {
                    break Err(e);
                }
                count += 1;
            }
        }
        Interpreter::MultiRow(multi) => {
            let mut groups = RowAggregator::new(cursor.as_mut(), multi.as_ref());
            let mut count = 0;
            loop {
                let rows = match groups.next_group() {
                    Ok(Some(rows)) => rows,
                    Ok(None) => break Ok(count),
                    Err(e) => break Err(e),
                };
                if let Err(e) = store(multi.interpret_rows(&rows), interpreter.name(), cache) {
                    break Err(e);
                }
                count += 1;
            }
        }
    };

    let closed = cursor.close();
    let count = drained?;
    closed?;

    debug!("Populated {} entries using {}", count, interpreter.name());
    Ok(count)
}

fn store<V: Clone>(
    interpreted: Result<Option<KeyValue<V>>>,
    interpreter: &str,
    cache: &CacheMap<V>,
) -> Result<()> {
    match interpreted? {
        Some(entry) => {
            cache.insert(entry);
            Ok(())
        }
        None => Err(CacheError::MissingKeyValue {
            interpreter: interpreter.to_string(),
        }),
    }
}

// == Row Aggregator ==
/// Groups consecutive rows that share a group key.
pub struct RowAggregator<'a, V> {
    cursor: &'a mut dyn RowCursor,
    interpreter: &'a dyn MultiRowInterpreter<V>,
    /// First row of the next group, read ahead while closing the previous one
    pending: Option<(CacheKey, Row)>,
}

impl<'a, V> RowAggregator<'a, V> {
    pub fn new(cursor: &'a mut dyn RowCursor, interpreter: &'a dyn MultiRowInterpreter<V>) -> Self {
        Self {
            cursor,
            interpreter,
            pending: None,
        }
    }

    /// Returns the rows of the next group, in cursor order.
    pub fn next_group(&mut self) -> Result<Option<Vec<Row>>> {
        let (key, first) = match self.pending.take() {
            Some(pending) => pending,
            None => match self.cursor.next_row()? {
                Some(row) => (self.interpreter.interpret_key(&row)?, row),
                None => return Ok(None),
            },
        };

        let mut rows = vec![first];
        while let Some(row) = self.cursor.next_row()? {
            let row_key = self.interpreter.interpret_key(&row)?;
            if row_key == key {
                rows.push(row);
            } else {
                self.pending = Some((row_key, row));
                break;
            }
        }
        Ok(Some(rows))
    }
}
