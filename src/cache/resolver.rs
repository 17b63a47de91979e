//! Cache-or-fetch orchestration.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheEntry, CacheKey, CacheStore, Clock};

/// Return the cached value for `key` when fresh, otherwise call `fetch`,
/// store its result and return it.
///
/// - `ttl == 0` skips the read entirely; `fetch` always runs.
/// - Fetch errors are returned unchanged and nothing is stored.
/// - Store failures on either side are logged and never surface: a failed
///   read is a miss, a failed write is dropped.
/// - A stored payload that no longer decodes as `T` is treated as a miss.
///
/// Concurrent calls for the same key may all fetch; there is no
/// in-flight de-duplication.
pub async fn resolve<T, E, F, Fut>(
    store: &dyn CacheStore,
    clock: &dyn Clock,
    key: &CacheKey,
    ttl: Duration,
    fetch: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !ttl.is_zero() {
        match store.get(key).await {
            Ok(Some(entry)) if store.is_fresh(&entry, ttl, clock.now()) => {
                match serde_json::from_slice::<T>(&entry.value) {
                    Ok(value) => {
                        tracing::debug!(key = %key, backend = store.name(), "Cache hit");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            backend = store.name(),
                            error = %e,
                            "Cached payload is unreadable, refetching"
                        );
                    }
                }
            }
            Ok(Some(entry)) => {
                tracing::debug!(
                    key = %key,
                    backend = store.name(),
                    stored_at = %entry.stored_at,
                    "Cache entry stale"
                );
            }
            Ok(None) => {
                tracing::debug!(key = %key, backend = store.name(), "Cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = store.name(),
                    error_kind = e.kind(),
                    error = %e,
                    "Cache read failed, treating as miss"
                );
            }
        }
    }

    let value = fetch().await?;

    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            let entry = CacheEntry::new(bytes, clock.now());
            if let Err(e) = store.put(key, &entry).await {
                tracing::warn!(
                    key = %key,
                    backend = store.name(),
                    error_kind = e.kind(),
                    error = %e,
                    "Cache write failed"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                key = %key,
                backend = store.name(),
                error_kind = "serialization",
                error = %e,
                "Cannot serialize value for cache"
            );
        }
    }

    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingStore;
    use super::*;
    use crate::cache::entry::test_support::ManualClock;
    use crate::cache::{LocalStore, SystemClock};
    use jiff::Timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const HOUR: Duration = Duration::from_secs(3_600);

    #[derive(Debug, PartialEq)]
    struct UpstreamDown;

    fn start() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    async fn counted_fetch(calls: &AtomicUsize, value: f64) -> Result<f64, UpstreamDown> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn test_hit_miss_expiry_scenario() {
        let store = RecordingStore::default();
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        let calls = AtomicUsize::new(0);

        let first = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 1.0)).await;
        assert_eq!(first, Ok(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.entries.lock().unwrap().get(&key).unwrap().stored_at,
            start()
        );

        clock.advance(Duration::from_secs(10));
        let second = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 2.0)).await;
        assert_eq!(second, Ok(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(3_591));
        let third = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 3.0)).await;
        assert_eq!(third, Ok(3.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_skips_read() {
        let store = RecordingStore::default();
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        store.entries.lock().unwrap().insert(
            key.clone(),
            CacheEntry::new(serde_json::to_vec(&9.0).unwrap(), start()),
        );
        let calls = AtomicUsize::new(0);

        let value = resolve(&store, &clock, &key, Duration::ZERO, || {
            counted_fetch(&calls, 1.0)
        })
        .await;

        assert_eq!(value, Ok(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_nothing_is_stored() {
        let store = RecordingStore::default();
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("NOPE");

        let result: Result<f64, UpstreamDown> =
            resolve(&store, &clock, &key, HOUR, || async { Err(UpstreamDown) }).await;

        assert_eq!(result, Err(UpstreamDown));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_on_stale_entry_is_not_masked() {
        let store = RecordingStore::default();
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        store.entries.lock().unwrap().insert(
            key.clone(),
            CacheEntry::new(serde_json::to_vec(&1.0).unwrap(), start()),
        );
        clock.advance(HOUR + Duration::from_secs(1));

        let result: Result<f64, UpstreamDown> =
            resolve(&store, &clock, &key, HOUR, || async { Err(UpstreamDown) }).await;

        assert_eq!(result, Err(UpstreamDown));
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_value() {
        let store = RecordingStore::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        let calls = AtomicUsize::new(0);

        let value = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 1.0)).await;

        assert_eq!(value, Ok(1.0));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_is_a_miss() {
        let store = RecordingStore::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        let calls = AtomicUsize::new(0);

        let value = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 1.0)).await;

        assert_eq!(value, Ok(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_refetched_and_replaced() {
        let store = RecordingStore::default();
        let clock = ManualClock::new(start());
        let key = CacheKey::ticker_info("AAPL");
        store.entries.lock().unwrap().insert(
            key.clone(),
            CacheEntry::new(b"{not json".to_vec(), start()),
        );
        let calls = AtomicUsize::new(0);

        let value = resolve(&store, &clock, &key, HOUR, || counted_fetch(&calls, 4.0)).await;

        assert_eq!(value, Ok(4.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stored = store.entries.lock().unwrap().get(&key).cloned().unwrap();
        assert_eq!(serde_json::from_slice::<f64>(&stored.value).unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_round_trip_through_local_store() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let key = CacheKey::ticker_info("TEF.MC");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let first: Result<Vec<String>, UpstreamDown> =
            resolve(&store, &SystemClock, &key, HOUR, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["EUR".to_string()])
            })
            .await;
        let second: Result<Vec<String>, UpstreamDown> =
            resolve(&store, &SystemClock, &key, HOUR, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["USD".to_string()])
            })
            .await;

        assert_eq!(first, Ok(vec!["EUR".to_string()]));
        assert_eq!(second, Ok(vec!["EUR".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
