//! Row Cursor Module
//!
//! Forward-only iteration over query results.

use std::collections::VecDeque;

use crate::db::Row;
use crate::error::Result;

// == Row Cursor ==
/// A forward-only cursor over the rows of one query.
pub trait RowCursor: Send {
    /// Advances the cursor, returning `None` once the rows are exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Releases the cursor's resources. Calling it twice is harmless.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// == Vec Cursor ==
/// Cursor over rows that are already in memory.
#[derive(Debug, Default)]
pub struct VecCursor {
    rows: VecDeque<Row>,
    closed: bool,
}

impl VecCursor {
    /// Creates a cursor yielding `rows` in order.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into(),
            closed: false,
        }
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for VecCursor {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    #[test]
    fn test_vec_cursor_yields_in_order() {
        let mut cursor = VecCursor::new(vec![
            Row::new(vec![Value::Integer(1)]),
            Row::new(vec![Value::Integer(2)]),
        ]);

        assert_eq!(cursor.next_row().unwrap().unwrap().get_int(1).unwrap(), 1);
        assert_eq!(cursor.next_row().unwrap().unwrap().get_int(1).unwrap(), 2);
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn test_vec_cursor_close_stops_iteration() {
        let mut cursor = VecCursor::new(vec![Row::new(vec![Value::Null])]);
        cursor.close().unwrap();

        assert!(cursor.is_closed());
        assert!(cursor.next_row().unwrap().is_none());
    }
}
