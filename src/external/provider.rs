use async_trait::async_trait;
use jiff::civil::Date;

use super::types::{Ticker, TickerInfo};
use crate::error::AppResult;

/// A source of market data.
///
/// Unknown symbols are reported as `AppError::NotFound`; transport and
/// payload failures as `AppError::Upstream`.
#[async_trait]
pub trait TickerDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_info(&self, ticker: &Ticker) -> AppResult<TickerInfo>;

    /// Daily close prices for trading days in `[start, end)`, oldest first.
    async fn get_close_history(&self, ticker: &Ticker, start: Date, end: Date)
    -> AppResult<Vec<f64>>;
}
