//! Domain types shared by market data providers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use jiff::civil::Date;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Letters, digits and the punctuation exchanges use in symbols
/// (`TEF.MC`, `BRK-B`, `^GSPC`, `EURUSD=X`).
static TICKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9^][A-Z0-9.\-=^]{0,19}$").unwrap_or_else(|_| unreachable!())
});

/// A validated, uppercased ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let symbol = raw.trim().to_uppercase();
        if TICKER_PATTERN.is_match(&symbol) {
            Ok(Self(symbol))
        } else {
            Err(AppError::validation(
                "ticker",
                format!("'{}' is not a valid ticker symbol", raw.trim()),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// High and low over a window of daily bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    pub high: f64,
    pub low: f64,
}

/// Snapshot of a listed security. This is the cached payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "price": 3.921,
    "name": "TELEFONICA",
    "ticker": "TEF.MC",
    "yearly_dividend_yield": 0.0765,
    "next_dividend_yield": 0.038,
    "yearly_dividend_value": 0.3,
    "next_dividend_value": 0.15,
    "website": "https://www.telefonica.com",
    "currency": "EUR",
    "ex_dividend_date": "2025-06-05",
    "earning_dates": ["2025-07-29"],
    "sector": "Communication Services",
    "country": "Spain",
    "industry": "Telecom Services",
    "is_etf": false,
    "monthly_price_range": { "high": 4.02, "low": 3.81 },
    "yearly_price_range": { "high": 4.71, "low": 3.61 }
}))]
pub struct TickerInfo {
    pub price: f64,
    pub name: String,
    pub ticker: String,
    pub yearly_dividend_yield: Option<f64>,
    pub next_dividend_yield: f64,
    pub yearly_dividend_value: Option<f64>,
    pub next_dividend_value: Option<f64>,
    pub website: Option<String>,
    pub currency: String,
    #[schema(value_type = Option<String>, format = Date)]
    pub ex_dividend_date: Option<Date>,
    #[schema(value_type = Vec<String>)]
    pub earning_dates: Vec<Date>,
    pub sector: String,
    pub country: String,
    pub industry: String,
    pub is_etf: bool,
    pub monthly_price_range: PriceRange,
    pub yearly_price_range: PriceRange,
}

/// One daily bar. Missing values stay `None` rather than becoming zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: Date,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_is_uppercased_and_trimmed() {
        assert_eq!(Ticker::parse(" tef.mc ").unwrap().as_str(), "TEF.MC");
    }

    #[test]
    fn test_ticker_accepts_exchange_punctuation() {
        for symbol in ["AAPL", "BRK-B", "^GSPC", "EURUSD=X", "does-not-exist"] {
            assert!(Ticker::parse(symbol).is_ok(), "{symbol} should parse");
        }
    }

    #[test]
    fn test_ticker_rejects_garbage() {
        for symbol in ["", "AAPL,MSFT", "a b", "../etc", "X".repeat(21).as_str()] {
            assert!(
                matches!(Ticker::parse(symbol), Err(AppError::Validation { .. })),
                "{symbol} should be rejected"
            );
        }
    }

    #[test]
    fn test_ticker_serde_validates() {
        let ticker: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ticker.as_str(), "MSFT");
        assert!(serde_json::from_str::<Ticker>("\"no way\"").is_err());
    }

    #[test]
    fn test_ticker_info_dates_serialize_as_iso() {
        let info = TickerInfo {
            price: 1.0,
            name: "X".into(),
            ticker: "X".into(),
            yearly_dividend_yield: None,
            next_dividend_yield: 0.0,
            yearly_dividend_value: None,
            next_dividend_value: None,
            website: None,
            currency: "USD".into(),
            ex_dividend_date: Some(jiff::civil::date(2024, 3, 8)),
            earning_dates: vec![jiff::civil::date(2024, 4, 25)],
            sector: String::new(),
            country: String::new(),
            industry: String::new(),
            is_etf: false,
            monthly_price_range: PriceRange { high: 1.0, low: 1.0 },
            yearly_price_range: PriceRange { high: 1.0, low: 1.0 },
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["ex_dividend_date"], "2024-03-08");
        assert_eq!(json["earning_dates"][0], "2024-04-25");

        let back: TickerInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
