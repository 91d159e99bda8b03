//! Property-Based Tests for the Expiring Object Cache
//!
//! Uses proptest with a manual clock so lifetimes can be checked exactly.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::expiring::{ExpiringObjectCache, ManualClock};

// == Test Configuration ==
const TEST_DEFAULT_LIFETIME: u64 = 300;

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

fn cache() -> (ExpiringObjectCache<String, u64>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache = ExpiringObjectCache::with_clock(TEST_DEFAULT_LIFETIME, 10_000, clock.clone());
    (cache, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* lifetime and any guarantee, the entry's remaining lifetime
    // after the guarantee is the larger of the two.
    #[test]
    fn prop_guarantee_is_monotonic(
        key in valid_key_strategy(),
        lifetime in 1u64..10_000,
        minimum in 0u64..10_000
    ) {
        let (cache, _) = cache();
        cache.put_with_lifetime(key.clone(), 1, lifetime);

        prop_assert!(cache.guarantee(&key, minimum));
        let ttl = cache.time_to_live(&key).unwrap();
        prop_assert_eq!(ttl, Duration::from_secs(lifetime.max(minimum)));
    }

    // *For any* entry, it is visible strictly before its lifetime elapses
    // and gone from then on.
    #[test]
    fn prop_expires_exactly_at_lifetime(
        key in valid_key_strategy(),
        value in any::<u64>(),
        lifetime in 1u64..1_000
    ) {
        let (cache, clock) = cache();
        cache.put_with_lifetime(key.clone(), value, lifetime);

        clock.advance(Duration::from_millis(lifetime * 1000 - 1));
        prop_assert_eq!(cache.get(&key), Some(value));

        clock.advance(Duration::from_millis(1));
        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(!cache.guarantee(&key, lifetime));
    }

    // *For any* mix of lifetimes, a sweep removes exactly the expired entries.
    #[test]
    fn prop_clean_counts_expired(
        lifetimes in prop::collection::vec(1u64..100, 1..50),
        elapsed in 0u64..120
    ) {
        let (cache, clock) = cache();
        for (i, lifetime) in lifetimes.iter().enumerate() {
            cache.put_with_lifetime(format!("k{}", i), i as u64, *lifetime);
        }
        clock.advance(Duration::from_secs(elapsed));

        let expected = lifetimes.iter().filter(|l| **l <= elapsed).count();
        prop_assert_eq!(cache.clean(), expected);
        prop_assert_eq!(cache.len(), lifetimes.len() - expected);
    }
}
