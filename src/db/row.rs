//! Row Module
//!
//! Column values and rows with 1-based typed accessors.

use std::fmt;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Value ==
/// A single column value as returned by the query service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// == Row ==
/// One result row. Column positions are 1-based, as in JDBC-style APIs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from its column values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw value at 1-based `position`.
    pub fn get_value(&self, position: usize) -> Result<&Value> {
        position
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| {
                CacheError::Column(format!(
                    "position {} out of range for row of {} columns",
                    position,
                    self.values.len()
                ))
            })
    }

    /// Returns true if the column holds SQL NULL.
    pub fn is_null(&self, position: usize) -> Result<bool> {
        Ok(matches!(self.get_value(position)?, Value::Null))
    }

    /// Integer column. NULL is an error; use `get_value` to inspect nulls.
    pub fn get_int(&self, position: usize) -> Result<i64> {
        match self.get_value(position)? {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(position, "integer", other)),
        }
    }

    /// Floating point column; integers widen.
    pub fn get_f64(&self, position: usize) -> Result<f64> {
        match self.get_value(position)? {
            Value::Real(r) => Ok(*r),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(mismatch(position, "real", other)),
        }
    }

    /// Boolean column stored as 0/1.
    pub fn get_bool(&self, position: usize) -> Result<bool> {
        Ok(self.get_int(position)? != 0)
    }

    /// Text column; NULL yields `None`, numbers are rendered as text.
    pub fn get_string(&self, position: usize) -> Result<Option<String>> {
        match self.get_value(position)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            Value::Integer(i) => Ok(Some(i.to_string())),
            Value::Real(r) => Ok(Some(r.to_string())),
            other => Err(mismatch(position, "text", other)),
        }
    }
}

fn mismatch(position: usize, expected: &str, found: &Value) -> CacheError {
    CacheError::Column(format!(
        "column {} expected {}, found {}",
        position,
        expected,
        found.type_name()
    ))
}
