//! Cache entry and clock.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

/// A stored payload together with the moment it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub stored_at: Timestamp,
}

impl CacheEntry {
    pub fn new(value: Vec<u8>, stored_at: Timestamp) -> Self {
        Self { value, stored_at }
    }

    /// `now - stored_at <= ttl`.
    ///
    /// An entry stamped in the future (clock skew between writers) counts
    /// as fresh.
    pub fn is_fresh(&self, ttl: Duration, now: Timestamp) -> bool {
        let age = now.duration_since(self.stored_at);
        let ttl = SignedDuration::try_from(ttl).unwrap_or(SignedDuration::MAX);
        age <= ttl
    }
}

/// Source of "now" for freshness checks and write stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    #[test]
    fn test_fresh_within_ttl() {
        let entry = CacheEntry::new(b"v".to_vec(), at(1_000));
        assert!(entry.is_fresh(Duration::from_secs(60), at(1_030)));
    }

    #[test]
    fn test_fresh_exactly_at_ttl() {
        let entry = CacheEntry::new(b"v".to_vec(), at(1_000));
        assert!(entry.is_fresh(Duration::from_secs(60), at(1_060)));
    }

    #[test]
    fn test_stale_past_ttl() {
        let entry = CacheEntry::new(b"v".to_vec(), at(1_000));
        assert!(!entry.is_fresh(Duration::from_secs(60), at(1_061)));
    }

    #[test]
    fn test_zero_ttl_only_fresh_at_same_instant() {
        let entry = CacheEntry::new(b"v".to_vec(), at(1_000));
        assert!(entry.is_fresh(Duration::ZERO, at(1_000)));
        assert!(!entry.is_fresh(Duration::ZERO, at(1_001)));
    }

    #[test]
    fn test_future_stamp_is_fresh() {
        let entry = CacheEntry::new(b"v".to_vec(), at(2_000));
        assert!(entry.is_fresh(Duration::from_secs(1), at(1_000)));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new(b"v".to_vec(), at(0));
        assert!(entry.is_fresh(Duration::from_secs(u64::MAX), at(1_000_000)));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = test_support::ManualClock::new(at(10));
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), at(15));
    }

    proptest! {
        #[test]
        fn prop_freshness_matches_age(
            stored in 0i64..1_000_000_000,
            age in 0i64..1_000_000,
            ttl in 0u64..1_000_000,
        ) {
            let entry = CacheEntry::new(Vec::new(), at(stored));
            let fresh = entry.is_fresh(Duration::from_secs(ttl), at(stored + age));
            prop_assert_eq!(fresh, age as u64 <= ttl);
        }
    }
}
