//! Expiring Object Cache Module
//!
//! A general-purpose in-memory cache whose entries expire after a lifetime.
//! Expired entries are dropped lazily on `get` and in batches by a sweep
//! that runs every N `get` calls.

mod clock;
mod entry;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::ExpiringEntry;
pub use store::ExpiringObjectCache;

// == Public Constants ==
/// Default number of `get` calls between full sweeps
pub const DEFAULT_SWEEP_EVERY: u64 = 10_000;
