//! Expiring Entry Module
//!
//! Defines an item together with the absolute time it expires at.

// == Expiring Entry ==
/// A cached item and its expiration time.
#[derive(Debug, Clone)]
pub struct ExpiringEntry<V> {
    /// The stored item
    pub item: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<V> ExpiringEntry<V> {
    // == Constructor ==
    /// Creates an entry living `lifetime_secs` from `now_ms`.
    pub fn new(item: V, now_ms: u64, lifetime_secs: u64) -> Self {
        Self {
            item,
            expires_at: now_ms.saturating_add(lifetime_secs.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// time, so a zero lifetime expires immediately.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Extend ==
    /// Moves the expiration to `until_ms` if that is later. Never shortens.
    pub fn extend_to(&mut self, until_ms: u64) {
        self.expires_at = self.expires_at.max(until_ms);
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}
