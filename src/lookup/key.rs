//! Cache Key Module
//!
//! Keys of the row-data caches and the key/value pairs row interpreters emit.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::db::Value;
use crate::error::{CacheError, Result};

// == Cache Key ==
/// A hashable cache key.
///
/// Text keys are case-insensitive: they are lower-cased before they are
/// stored and before they are looked up. Other variants pass through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CacheKey {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl CacheKey {
    /// Builds a key from a column value. Real and blob columns cannot key a map.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(CacheKey::Null),
            Value::Integer(i) => Ok(CacheKey::Integer(*i)),
            Value::Text(s) => Ok(CacheKey::Text(s.clone())),
            other => Err(CacheError::Configuration(format!(
                "column value {} cannot be used as a cache key",
                other
            ))),
        }
    }

    /// Returns the key in the form it is stored under.
    pub fn normalize(self) -> Self {
        match self {
            CacheKey::Text(s) => CacheKey::Text(s.to_lowercase()),
            other => other,
        }
    }

    /// Borrowing variant of `normalize`; only text keys that change allocate.
    ///
    /// Titlecase letters are not uppercase but still lower-case, so the test
    /// is whether lower-casing changes any character.
    pub fn normalized(&self) -> Cow<'_, CacheKey> {
        match self {
            CacheKey::Text(s) if s.chars().flat_map(char::to_lowercase).ne(s.chars()) => {
                Cow::Owned(CacheKey::Text(s.to_lowercase()))
            }
            other => Cow::Borrowed(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CacheKey::Null)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Null => write!(f, "null"),
            CacheKey::Bool(b) => write!(f, "{}", b),
            CacheKey::Integer(i) => write!(f, "{}", i),
            CacheKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CacheKey {
    fn from(v: i64) -> Self {
        CacheKey::Integer(v)
    }
}

impl From<i32> for CacheKey {
    fn from(v: i32) -> Self {
        CacheKey::Integer(v as i64)
    }
}

impl From<bool> for CacheKey {
    fn from(v: bool) -> Self {
        CacheKey::Bool(v)
    }
}

impl From<&str> for CacheKey {
    fn from(v: &str) -> Self {
        CacheKey::Text(v.to_string())
    }
}

impl From<&String> for CacheKey {
    fn from(v: &String) -> Self {
        CacheKey::Text(v.clone())
    }
}

impl From<String> for CacheKey {
    fn from(v: String) -> Self {
        CacheKey::Text(v)
    }
}

impl From<&CacheKey> for CacheKey {
    fn from(v: &CacheKey) -> Self {
        v.clone()
    }
}

impl<T: Into<CacheKey>> From<Option<T>> for CacheKey {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CacheKey::Null)
    }
}

// == Key Value ==
/// An immutable key/value pair produced by a row interpreter, one per cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue<V> {
    key: CacheKey,
    value: V,
}

impl<V> KeyValue<V> {
    pub fn new(key: impl Into<CacheKey>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (CacheKey, V) {
        (self.key, self.value)
    }
}
