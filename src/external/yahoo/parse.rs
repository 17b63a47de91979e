//! Turns raw quote payloads into domain values.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};

use super::types::{ChartResult, QuoteSummaryResult, raw};
use crate::external::types::{DailyBar, PriceRange, Ticker, TickerInfo};

const MONTH_DAYS: i64 = 30;
const YEAR_DAYS: i64 = 365;

/// Converts epoch seconds to a calendar date in UTC.
pub(super) fn epoch_date(seconds: i64) -> Option<Date> {
    Timestamp::from_second(seconds)
        .ok()
        .map(|ts| ts.to_zoned(TimeZone::UTC).date())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Flattens a chart result into bars dated in the exchange's timezone.
pub(super) fn daily_bars(chart: &ChartResult) -> Vec<DailyBar> {
    let tz = chart
        .meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| TimeZone::get(name).ok())
        .unwrap_or(TimeZone::UTC);

    let Some(series) = chart.indicators.quote.first() else {
        return Vec::new();
    };
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &seconds)| {
            let date = Timestamp::from_second(seconds)
                .ok()?
                .to_zoned(tz.clone())
                .date();
            Some(DailyBar {
                date,
                high: at(&series.high, i),
                low: at(&series.low, i),
                close: at(&series.close, i),
            })
        })
        .collect()
}

/// Highest high and lowest low over bars dated on or after `since`.
///
/// `None` when no bar in the window carries both values.
pub(super) fn price_range(bars: &[DailyBar], since: Date) -> Option<PriceRange> {
    let window = bars.iter().filter(|bar| bar.date >= since);
    let high = window
        .clone()
        .filter_map(|bar| bar.high)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    let low = window
        .filter_map(|bar| bar.low)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))));

    Some(PriceRange {
        high: high?,
        low: low?,
    })
}

/// Close prices for bars dated in `[start, end)`.
pub(super) fn closes_between(bars: &[DailyBar], start: Date, end: Date) -> Vec<f64> {
    bars.iter()
        .filter(|bar| bar.date >= start && bar.date < end)
        .filter_map(|bar| bar.close)
        .collect()
}

/// Why a quote summary could not become a `TickerInfo`.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum SummaryProblem {
    /// Summary carries no identifying data at all.
    Empty,
    /// Neither a market price nor a NAV is present.
    NoPrice,
}

/// Builds a `TickerInfo` from a quote summary and a year of daily bars.
///
/// Price ranges fall back to the current price when the window has no bars.
pub(super) fn build_ticker_info(
    ticker: &Ticker,
    summary: &QuoteSummaryResult,
    bars: &[DailyBar],
    today: Date,
) -> Result<TickerInfo, SummaryProblem> {
    if summary.price.is_none() && summary.quote_type.is_none() && summary.summary_detail.is_none()
    {
        return Err(SummaryProblem::Empty);
    }

    let price_module = summary.price.as_ref();
    let detail = summary.summary_detail.as_ref();
    let profile = summary.summary_profile.as_ref();
    let quote_type = summary.quote_type.as_ref();

    let price = summary
        .financial_data
        .as_ref()
        .and_then(|f| raw(&f.current_price))
        .or_else(|| detail.and_then(|d| raw(&d.nav_price)))
        .or_else(|| price_module.and_then(|p| raw(&p.regular_market_price)))
        .filter(|p| *p > 0.0)
        .ok_or(SummaryProblem::NoPrice)?;

    let last_dividend = summary
        .default_key_statistics
        .as_ref()
        .and_then(|k| raw(&k.last_dividend_value));
    let trailing_rate = detail.and_then(|d| raw(&d.trailing_annual_dividend_rate));
    let next_dividend_yield = last_dividend
        .or(trailing_rate)
        .map(|value| round3(value / price))
        .unwrap_or(0.0);

    let is_etf = quote_type
        .and_then(|q| q.quote_type.as_deref())
        .is_some_and(|t| t.eq_ignore_ascii_case("ETF"));

    let ex_dividend_date = detail
        .and_then(|d| raw(&d.ex_dividend_date))
        .or_else(|| {
            summary
                .calendar_events
                .as_ref()
                .and_then(|c| raw(&c.ex_dividend_date))
        })
        .and_then(epoch_date);

    let mut earning_dates: Vec<Date> = if is_etf {
        Vec::new()
    } else {
        summary
            .calendar_events
            .as_ref()
            .and_then(|c| c.earnings.as_ref())
            .map(|e| {
                e.earnings_date
                    .iter()
                    .filter_map(|d| d.raw)
                    .filter_map(epoch_date)
                    .collect()
            })
            .unwrap_or_default()
    };
    earning_dates.sort();
    earning_dates.dedup();

    let name = price_module
        .and_then(|p| p.short_name.clone().or_else(|| p.long_name.clone()))
        .or_else(|| quote_type.and_then(|q| q.short_name.clone()))
        .unwrap_or_default();

    let currency = price_module
        .and_then(|p| p.currency.clone())
        .or_else(|| detail.and_then(|d| d.currency.clone()))
        .unwrap_or_default();

    let fallback = PriceRange {
        high: price,
        low: price,
    };
    let monthly_price_range =
        price_range(bars, today.saturating_sub(MONTH_DAYS.days())).unwrap_or(fallback);
    let yearly_price_range =
        price_range(bars, today.saturating_sub(YEAR_DAYS.days())).unwrap_or(fallback);

    Ok(TickerInfo {
        price,
        name,
        ticker: ticker.to_string(),
        yearly_dividend_yield: detail.and_then(|d| raw(&d.dividend_yield)),
        next_dividend_yield,
        yearly_dividend_value: detail.and_then(|d| raw(&d.dividend_rate)),
        next_dividend_value: last_dividend,
        website: profile.and_then(|p| p.website.clone()),
        currency,
        ex_dividend_date,
        earning_dates,
        sector: profile
            .and_then(|p| p.sector_disp.clone().or_else(|| p.sector.clone()))
            .unwrap_or_default(),
        country: profile.and_then(|p| p.country.clone()).unwrap_or_default(),
        industry: profile
            .and_then(|p| p.industry_disp.clone().or_else(|| p.industry.clone()))
            .unwrap_or_default(),
        is_etf,
        monthly_price_range,
        yearly_price_range,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn stock_summary() -> Value {
        json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "shortName": "TELEFONICA",
                        "longName": "Telefonica, S.A.",
                        "currency": "EUR",
                        "regularMarketPrice": { "raw": 3.95, "fmt": "3.95" }
                    },
                    "financialData": { "currentPrice": { "raw": 3.921, "fmt": "3.92" } },
                    "summaryProfile": {
                        "sector": "Communication Services",
                        "sectorDisp": "Communication Services",
                        "industry": "Telecom Services",
                        "industryDisp": "Telecom Services",
                        "country": "Spain",
                        "website": "https://www.telefonica.com"
                    },
                    "summaryDetail": {
                        "dividendYield": { "raw": 0.0765, "fmt": "7.65%" },
                        "dividendRate": { "raw": 0.3, "fmt": "0.30" },
                        "trailingAnnualDividendRate": { "raw": 0.3, "fmt": "0.30" },
                        "exDividendDate": { "raw": 1_717_545_600, "fmt": "2024-06-05" }
                    },
                    "quoteType": { "quoteType": "EQUITY", "shortName": "TELEFONICA" },
                    "calendarEvents": {
                        "earnings": {
                            "earningsDate": [
                                { "raw": 1_722_211_200, "fmt": "2024-07-29" },
                                { "raw": 1_722_211_200, "fmt": "2024-07-29" }
                            ]
                        }
                    },
                    "defaultKeyStatistics": { "lastDividendValue": { "raw": 0.15, "fmt": "0.15" } }
                }],
                "error": null
            }
        })
    }

    pub fn etf_summary() -> Value {
        json!({
            "quoteSummary": {
                "result": [{
                    "price": { "shortName": "Vanguard S&P 500 ETF", "currency": "USD" },
                    "summaryDetail": {
                        "navPrice": { "raw": 500.0 },
                        "trailingAnnualDividendRate": { "raw": 6.5 },
                        "dividendYield": {}
                    },
                    "quoteType": { "quoteType": "ETF" },
                    "calendarEvents": {
                        "earnings": { "earningsDate": [{ "raw": 1_722_211_200 }] }
                    }
                }],
                "error": null
            }
        })
    }

    pub fn not_found_summary() -> Value {
        json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Not Found", "description": "Quote not found for symbol: ZZZZ" }
            }
        })
    }

    /// Daily bars ending at `last` (epoch seconds), one per day going back.
    pub fn chart(last: i64, highs: &[f64], lows: &[f64]) -> Value {
        let n = highs.len() as i64;
        let timestamps: Vec<i64> = (0..n).map(|i| last - (n - 1 - i) * 86_400).collect();
        let closes: Vec<f64> = highs
            .iter()
            .zip(lows)
            .map(|(h, l)| (h + l) / 2.0)
            .collect();
        json!({
            "chart": {
                "result": [{
                    "meta": { "exchangeTimezoneName": "UTC" },
                    "timestamp": timestamps,
                    "indicators": { "quote": [{ "high": highs, "low": lows, "close": closes }] }
                }],
                "error": null
            }
        })
    }
}
