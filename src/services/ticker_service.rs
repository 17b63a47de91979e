//! Ticker lookups through the cache.

use std::sync::Arc;

use jiff::civil::Date;

use crate::cache::{CacheKey, CacheManager};
use crate::error::{AppError, AppResult};
use crate::external::{Ticker, TickerDataProvider, TickerInfo};

/// Service answering ticker queries.
///
/// Info records go through the cache; close history is always fetched.
#[derive(Clone)]
pub struct TickerService {
    provider: Arc<dyn TickerDataProvider>,
    cache: CacheManager,
}

impl TickerService {
    pub fn new(provider: Arc<dyn TickerDataProvider>, cache: CacheManager) -> Self {
        Self { provider, cache }
    }

    /// Get the info record for a ticker, served from cache while fresh.
    pub async fn get_info(&self, ticker: &Ticker) -> AppResult<TickerInfo> {
        let key = CacheKey::ticker_info(ticker.as_str());
        let provider = &self.provider;
        self.cache
            .resolve(&key, move || async move {
                tracing::debug!(provider = provider.name(), ticker = %ticker, "Fetching ticker info");
                provider.get_info(ticker).await
            })
            .await
    }

    /// Get daily close prices in `[start, end)`.
    pub async fn get_close_history(
        &self,
        ticker: &Ticker,
        start: Date,
        end: Date,
    ) -> AppResult<Vec<f64>> {
        if start >= end {
            return Err(AppError::validation(
                "start",
                format!("start ({}) must be before end ({})", start, end),
            ));
        }
        self.provider.get_close_history(ticker, start, end).await
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::civil::date;
    use tempfile::tempdir;

    use super::test_support::FakeProvider;
    use super::*;
    use crate::cache::LocalStore;

    async fn service_with_cache(
        ttl: Duration,
    ) -> (TickerService, Arc<FakeProvider>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let provider = Arc::new(FakeProvider::default());
        let service = TickerService::new(
            provider.clone(),
            CacheManager::with_store(Arc::new(store), ttl),
        );
        (service, provider, dir)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let (service, provider, _dir) = service_with_cache(Duration::from_secs(3_600)).await;
        let ticker = Ticker::parse("aapl").unwrap();

        let first = service.get_info(&ticker).await.unwrap();
        let second = service.get_info(&ticker).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.info_calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_value_survives_upstream_outage() {
        let (service, provider, _dir) = service_with_cache(Duration::from_secs(3_600)).await;
        let ticker = Ticker::parse("AAPL").unwrap();

        service.get_info(&ticker).await.unwrap();
        provider.set_failing(true);

        assert!(service.get_info(&ticker).await.is_ok());
        assert_eq!(provider.info_calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let provider = Arc::new(FakeProvider::default());
        let service = TickerService::new(provider.clone(), CacheManager::disabled());
        let ticker = Ticker::parse("AAPL").unwrap();

        service.get_info(&ticker).await.unwrap();
        service.get_info(&ticker).await.unwrap();

        assert_eq!(provider.info_calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (service, provider, _dir) = service_with_cache(Duration::from_secs(3_600)).await;
        let ticker = Ticker::parse("ZZZZ").unwrap();

        for _ in 0..2 {
            let err = service.get_info(&ticker).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound { .. }));
        }
        assert_eq!(provider.info_calls(), 2);
    }

    #[tokio::test]
    async fn test_history_rejects_inverted_range() {
        let provider = Arc::new(FakeProvider::default());
        let service = TickerService::new(provider.clone(), CacheManager::disabled());
        let ticker = Ticker::parse("AAPL").unwrap();

        let err = service
            .get_close_history(&ticker, date(2024, 2, 1), date(2024, 2, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(
            provider
                .history_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_history_is_not_cached() {
        let (service, provider, _dir) = service_with_cache(Duration::from_secs(3_600)).await;
        let ticker = Ticker::parse("AAPL").unwrap();

        let closes = service
            .get_close_history(&ticker, date(2024, 1, 1), date(2024, 1, 4))
            .await
            .unwrap();
        service
            .get_close_history(&ticker, date(2024, 1, 1), date(2024, 1, 4))
            .await
            .unwrap();

        assert_eq!(closes, vec![180.0, 181.0, 182.0]);
        assert_eq!(
            provider
                .history_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            2
        );
    }
}
