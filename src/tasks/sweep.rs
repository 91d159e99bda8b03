//! Expiring Cache Sweep Task
//!
//! Background task that periodically removes expired objects.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::expiring::ExpiringObjectCache;

/// Spawns a background task that sweeps `cache` every `interval_secs`.
///
/// The sweep is the same `clean` that `get` triggers, so a sweep already in
/// progress makes the task's run a no-op.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(ExpiringObjectCache::<String, String>::new(300));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V>(cache: Arc<ExpiringObjectCache<K, V>>, interval_secs: u64) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiring cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = cache.clean();

            if removed > 0 {
                info!("Expiring sweep: removed {} expired objects", removed);
            } else {
                debug!("Expiring sweep: no expired objects found");
            }
        }
    })
}
