//! Service layer for business logic operations.
//!
//! Services coordinate between the cache, upstream providers and handlers.

mod ticker_service;

#[cfg(test)]
pub(crate) use ticker_service::test_support;
pub use ticker_service::TickerService;

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::external::TickerDataProvider;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since services hold `Arc`s internally.
#[derive(Clone)]
pub struct Services {
    pub tickers: TickerService,
}

impl Services {
    pub fn new(provider: Arc<dyn TickerDataProvider>, cache: CacheManager) -> Self {
        Self {
            tickers: TickerService::new(provider, cache),
        }
    }
}
