//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::external::TickerDataProvider;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services and the cache manager use `Arc` internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Cache manager, kept for health reporting
    pub cache: CacheManager,
}

impl AppState {
    /// Creates a new AppState from a data provider and a cache manager.
    ///
    /// # Example
    /// ```ignore
    /// let cache = CacheManager::new(&settings.cache).await?;
    /// let provider = Arc::new(YahooFinance::new(&settings.provider)?);
    /// let state = AppState::new(provider, cache);
    /// ```
    pub fn new(provider: Arc<dyn TickerDataProvider>, cache: CacheManager) -> Self {
        let services = Services::new(provider, cache.clone());
        Self { services, cache }
    }
}
