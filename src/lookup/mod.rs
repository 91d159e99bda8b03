//! Row Data Cache Module
//!
//! Database-backed lookup caches: a handler owns the map, a strategy decides
//! when the map is filled, and a lookup source supplies the queries and the
//! row interpreter.
//!
//! - [`FullCachedLookup`] loads its whole table with one query on first use
//! - [`LazyCachedLookup`] fetches missing keys one query at a time

mod cached;
mod handler;
pub mod helper;
mod interpreter;
mod key;
mod map;
mod strategy;


// Re-export public types
pub use cached::{CachedLookup, FullCachedLookup, LazyCachedLookup};
pub use handler::{FullPopulated, LazyPopulated, LookupSource, RowDataCacheHandler};
pub use interpreter::{Interpreter, MultiRowInterpreter, RowInterpreter};
pub use key::{CacheKey, KeyValue};
pub use map::CacheMap;
pub use strategy::{
    CacheContext, CacheType, FullCacheStrategy, InitOnce, LazyCacheStrategy, RowDataCacheStrategy,
};
