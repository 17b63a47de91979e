pub mod client;
pub mod provider;
pub mod types;
pub mod user_agent;
pub mod yahoo;

pub use provider::TickerDataProvider;
pub use types::{DailyBar, PriceRange, Ticker, TickerInfo};
pub use yahoo::YahooFinance;
