//! Fetch command handler
//!
//! Resolves one ticker through the configured cache and prints the record.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::external::{Ticker, TickerDataProvider, YahooFinance};
use crate::services::TickerService;

/// Handler for the fetch command
pub struct FetchCommandHandler {
    config: Settings,
}

impl FetchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Print the record for `ticker` as pretty JSON on stdout.
    pub async fn execute(&self, ticker: &str) -> AppResult<()> {
        let provider = YahooFinance::new(&self.config.provider)?;
        let json = self.resolve(Arc::new(provider), ticker).await?;
        println!("{}", json);
        Ok(())
    }

    async fn resolve(
        &self,
        provider: Arc<dyn TickerDataProvider>,
        ticker: &str,
    ) -> AppResult<String> {
        let ticker = Ticker::parse(ticker)?;
        let cache = CacheManager::new(&self.config.cache).await?;
        let info = TickerService::new(provider, cache).get_info(&ticker).await?;

        serde_json::to_string_pretty(&info).map_err(|e| AppError::Internal { source: e.into() })
    }
}
