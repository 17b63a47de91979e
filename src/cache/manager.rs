//! Cache manager that selects and owns the configured store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::local::LocalStore;
use crate::cache::noop::NoOpStore;
use crate::cache::remote::{RemoteLocation, RemoteStore};
use crate::cache::{CacheError, CacheKey, CacheStore, Clock, SystemClock, resolver};
use crate::config::settings::CacheConfig;

/// Owns the active store, its TTL and the clock used to stamp entries.
///
/// Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl CacheManager {
    /// Build the store described by `config`.
    ///
    /// Disabled caching, or a zero TTL, selects the no-op store. A `gs://`
    /// location selects the remote store; anything else is a directory.
    pub async fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let ttl = Duration::from_secs(config.ttl_seconds);

        let store: Arc<dyn CacheStore> = if config.disabled || ttl.is_zero() {
            Arc::new(NoOpStore::new())
        } else if RemoteLocation::is_remote(&config.dir) {
            Arc::new(RemoteStore::new(&config.dir, &config.remote)?)
        } else {
            Arc::new(LocalStore::new(&config.dir).await?)
        };

        tracing::info!(
            backend = store.name(),
            location = %config.dir,
            ttl_seconds = config.ttl_seconds,
            "Cache initialized"
        );

        Ok(Self {
            store,
            clock: Arc::new(SystemClock),
            ttl,
        })
    }

    /// Wrap an existing store.
    pub fn with_store(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl,
        }
    }

    /// No-op manager; every call fetches.
    pub fn disabled() -> Self {
        Self::with_store(Arc::new(NoOpStore::new()), Duration::ZERO)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Cache-or-fetch with the manager's store, clock and TTL.
    pub async fn resolve<T, E, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        resolver::resolve(
            self.store.as_ref(),
            self.clock.as_ref(),
            key,
            self.ttl,
            fetch,
        )
        .await
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("backend", &self.store.name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::test_support::ManualClock;
    use crate::cache::resolver::test_support::RecordingStore;
    use jiff::Timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn config(dir: &str, ttl_seconds: u64, disabled: bool) -> CacheConfig {
        CacheConfig {
            dir: dir.to_string(),
            ttl_seconds,
            disabled,
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_selects_noop() {
        let dir = tempdir().unwrap();
        let manager = CacheManager::new(&config(dir.path().to_str().unwrap(), 3_600, true))
            .await
            .unwrap();
        assert_eq!(manager.backend_name(), "disabled");
    }

    #[tokio::test]
    async fn test_zero_ttl_selects_noop() {
        let dir = tempdir().unwrap();
        let manager = CacheManager::new(&config(dir.path().to_str().unwrap(), 0, false))
            .await
            .unwrap();
        assert_eq!(manager.backend_name(), "disabled");
        assert!(!manager.is_enabled());
    }

    #[tokio::test]
    async fn test_directory_selects_local() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let manager = CacheManager::new(&config(cache_dir.to_str().unwrap(), 60, false))
            .await
            .unwrap();
        assert_eq!(manager.backend_name(), "local");
        assert!(cache_dir.is_dir());
    }

    #[tokio::test]
    async fn test_bucket_uri_selects_remote() {
        let manager = CacheManager::new(&config("gs://tickers/cache", 60, false))
            .await
            .unwrap();
        assert_eq!(manager.backend_name(), "remote");
    }

    #[tokio::test]
    async fn test_malformed_bucket_uri_is_rejected() {
        let result = CacheManager::new(&config("gs://", 60, false)).await;
        assert!(matches!(result, Err(CacheError::InvalidLocation(_))));
    }

    #[tokio::test]
    async fn test_resolve_uses_injected_clock() {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualClock::new(Timestamp::from_second(1_000).unwrap()));
        let manager = CacheManager::with_store(store.clone(), Duration::from_secs(60))
            .with_clock(clock.clone());
        let key = CacheKey::ticker_info("AAPL");
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(calls.load(Ordering::SeqCst))
        };

        assert_eq!(manager.resolve(&key, fetch).await, Ok(1));
        clock.advance(Duration::from_secs(60));
        assert_eq!(manager.resolve(&key, fetch).await, Ok(1));
        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.resolve(&key, fetch).await, Ok(2));
    }
}
