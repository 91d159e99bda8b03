//! Text Cache Module
//!
//! Caches of text blobs identified by `(text_type, id)`, where the text type
//! is a namespace that maps onto a directory.
//!
//! - [`DiskTextZipCache`] keeps gzip files under `<root>/<text_type>/<id>`
//! - [`FastTextCache`] adds an in-memory tier filled by reads

mod cache;
mod disk;
mod fast;
mod stats;

// Re-export public types
pub use cache::{validate_identifier, TextCache};
pub use disk::DiskTextZipCache;
pub use fast::{FastTextCache, FixedMemoryProbe, MemoryProbe, SystemMemoryProbe};
pub use stats::{HitCounts, TextCacheStats};
