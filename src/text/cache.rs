//! Text Cache Trait
//!
//! Storage-independent part of every text cache: identifier validation and
//! hit/miss accounting. Implementations supply the two storage primitives.

use std::collections::BTreeMap;

use crate::error::{CacheError, Result};
use crate::text::{HitCounts, TextCacheStats};

/// Checks that a text type or id can be used as a single path component.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CacheError::InvalidTextType(format!("{} must not be empty", kind)));
    }
    if value == "." || value == ".." {
        return Err(CacheError::InvalidTextType(format!(
            "{} '{}' is a relative directory reference",
            kind, value
        )));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(CacheError::InvalidTextType(format!(
            "{} '{}' contains a path separator",
            kind, value
        )));
    }
    Ok(())
}

// == Text Cache ==
/// A cache of text blobs keyed by `(text_type, id)`.
///
/// Every get funnels through `primitive_get`, so the hit/miss counters
/// count each request exactly once.
pub trait TextCache: Send + Sync {
    /// Reads the stored text, `None` if there is no entry.
    fn primitive_get(&self, text_type: &str, id: &str) -> Result<Option<String>>;

    /// Stores text, replacing any existing entry.
    fn primitive_put(&self, text_type: &str, id: &str, contents: &str) -> Result<()>;

    /// The counters this cache records into.
    fn stats(&self) -> &TextCacheStats;

    // == Get ==
    /// Returns the stored text and records a hit or a miss for `text_type`.
    fn get(&self, text_type: &str, id: &str) -> Result<Option<String>> {
        validate_identifier("text type", text_type)?;
        validate_identifier("id", id)?;

        let found = self.primitive_get(text_type, id)?;
        match found {
            Some(_) => self.stats().record_hit(text_type),
            None => self.stats().record_miss(text_type),
        }
        Ok(found)
    }

    /// Returns the stored text split into lines.
    fn get_lines(&self, text_type: &str, id: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .get(text_type, id)?
            .map(|text| text.lines().map(str::to_string).collect()))
    }

    /// Returns the stored text, computing and storing it on a miss.
    fn get_or_insert_with<F>(&self, text_type: &str, id: &str, make: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
        Self: Sized,
    {
        if let Some(text) = self.get(text_type, id)? {
            return Ok(text);
        }
        let text = make()?;
        self.primitive_put(text_type, id, &text)?;
        Ok(text)
    }

    // == Put ==
    fn put(&self, text_type: &str, id: &str, contents: &str) -> Result<()> {
        validate_identifier("text type", text_type)?;
        validate_identifier("id", id)?;
        self.primitive_put(text_type, id, contents)
    }

    fn hits(&self, text_type: &str) -> u64 {
        self.stats().counts(text_type).hits
    }

    fn misses(&self, text_type: &str) -> u64 {
        self.stats().counts(text_type).misses
    }

    /// `100 * hits / (hits + misses)` for one type; 100.0 before any get.
    fn hit_rate(&self, text_type: &str) -> f64 {
        self.stats().counts(text_type).hit_rate()
    }

    fn total_hits(&self) -> u64 {
        self.stats().total().hits
    }

    fn total_misses(&self) -> u64 {
        self.stats().total().misses
    }

    fn total_hit_rate(&self) -> f64 {
        self.stats().total().hit_rate()
    }

    fn stats_snapshot(&self) -> BTreeMap<String, HitCounts> {
        self.stats().snapshot()
    }
}
