//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the caches.
//!
//! # Tasks
//! - Expiring sweep: removes expired objects at a fixed interval, in
//!   addition to the sweep run every N gets

mod sweep;

pub use sweep::spawn_sweep_task;
