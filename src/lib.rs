//! SHR Cache - Lookup, expiring-object and text caches
//!
//! Row-data lookups populated from a query service (fully up front or on
//! demand), a time-expiring object cache, and a gzip disk text cache with a
//! memory tier. An axum admin server exposes the shared caches.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod expiring;
pub mod lookup;
pub mod models;
pub mod registry;
pub mod tasks;
pub mod text;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use registry::CacheRegistry;
pub use tasks::spawn_sweep_task;
