//! Configuration Module
//!
//! Handles loading cache and admin server settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the gzip text cache
    pub text_cache_dir: PathBuf,
    /// Default lifetime in seconds for expiring objects put without one
    pub default_lifetime: u64,
    /// Number of expiring-cache `get` calls between full sweeps
    pub sweep_every: u64,
    /// Background sweep interval in seconds (0 disables the task)
    pub cleanup_interval: u64,
    /// Fraction of memory that must be free before text is kept in memory
    pub memory_free_ratio: f64,
    /// HTTP admin server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TEXT_CACHE_DIR` - Text cache root (default: ./text_cache)
    /// - `DEFAULT_LIFETIME` - Expiring object lifetime in seconds (default: 300)
    /// - `SWEEP_EVERY` - Gets between expiring-cache sweeps (default: 10000)
    /// - `CLEANUP_INTERVAL` - Background sweep frequency in seconds (default: 60)
    /// - `MEMORY_FREE_RATIO` - Memory admission threshold (default: 0.5)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            text_cache_dir: env::var("TEXT_CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.text_cache_dir),
            default_lifetime: parse_var("DEFAULT_LIFETIME").unwrap_or(defaults.default_lifetime),
            sweep_every: parse_var("SWEEP_EVERY")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.sweep_every),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            memory_free_ratio: parse_var("MEMORY_FREE_RATIO")
                .filter(|r: &f64| (0.0..=1.0).contains(r))
                .unwrap_or(defaults.memory_free_ratio),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_cache_dir: PathBuf::from("./text_cache"),
            default_lifetime: 300,
            sweep_every: 10_000,
            cleanup_interval: 60,
            memory_free_ratio: 0.5,
            server_port: 3000,
        }
    }
}
