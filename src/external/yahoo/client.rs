use async_trait::async_trait;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;

use super::parse::{SummaryProblem, build_ticker_info, closes_between, daily_bars};
use super::types::{ChartResponse, ChartResult, QuoteSummaryResponse};
use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::build_http_client;
use crate::external::provider::TickerDataProvider;
use crate::external::types::{Ticker, TickerInfo};

const PROVIDER: &str = "yahoo";

const SUMMARY_MODULES: &str = "price,summaryProfile,summaryDetail,quoteType,calendarEvents,defaultKeyStatistics,financialData";

/// Days of daily bars fetched to compute price ranges.
const RANGE_LOOKBACK_DAYS: i64 = 366;

/// Yahoo Finance quote API client.
///
/// The quote summary endpoint requires a crumb bound to a session cookie.
/// Both are obtained lazily and the crumb is refreshed once when the API
/// rejects it.
pub struct YahooFinance {
    client: Client,
    quote_base_url: String,
    crumb_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooFinance {
    pub fn new(config: &ProviderConfig) -> AppResult<Self> {
        let client = build_http_client(config).map_err(|e| {
            Self::make_error(format!("failed to build HTTP client: {}", e), Some(e.into()))
        })?;

        Ok(Self {
            client,
            quote_base_url: config.quote_base_url.trim_end_matches('/').to_string(),
            crumb_url: config.crumb_url.clone(),
            cookie_url: config.cookie_url.clone(),
            crumb: Mutex::new(None),
        })
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::Upstream {
            provider: PROVIDER.into(),
            message: message.into(),
            source,
        }
    }

    fn not_found(ticker: &Ticker) -> AppError {
        AppError::not_found("ticker", "symbol", ticker.as_str())
    }

    async fn crumb(&self) -> AppResult<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie page answers 404 but still sets the session cookie.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            tracing::debug!(error = %e, "Cookie request failed, continuing without");
        }

        let crumb = self
            .client
            .get(&self.crumb_url)
            .send()
            .await
            .map_err(|e| Self::make_error(format!("crumb request failed: {}", e), Some(e.into())))?
            .error_for_status()
            .map_err(|e| Self::make_error(format!("crumb HTTP error: {}", e), Some(e.into())))?
            .text()
            .await
            .map_err(|e| Self::make_error(format!("crumb unreadable: {}", e), Some(e.into())))?;

        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(Self::make_error("crumb endpoint returned no crumb", None));
        }

        tracing::debug!("Obtained quote API crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn forget_crumb(&self) {
        self.crumb.lock().await.take();
    }

    fn endpoint(path: &str, params: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = Url::parse(path)
            .map_err(|e| Self::make_error(format!("invalid endpoint {}: {}", path, e), None))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn fetch_summary(&self, ticker: &Ticker) -> AppResult<QuoteSummaryResponse> {
        let path = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.quote_base_url,
            urlencoding::encode(ticker.as_str())
        );

        let mut refreshed = false;
        loop {
            let crumb = self.crumb().await?;
            let url = Self::endpoint(
                &path,
                &[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())],
            )?;
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| {
                    Self::make_error(
                        format!("quoteSummary({}) request failed: {}", ticker, e),
                        Some(e.into()),
                    )
                })?;

            match resp.status() {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if !refreshed => {
                    tracing::debug!(ticker = %ticker, "Crumb rejected, refreshing");
                    self.forget_crumb().await;
                    refreshed = true;
                    continue;
                }
                StatusCode::NOT_FOUND => return Err(Self::not_found(ticker)),
                _ => {}
            }

            let resp = resp.error_for_status().map_err(|e| {
                Self::make_error(
                    format!("quoteSummary({}) HTTP error: {}", ticker, e),
                    Some(e.into()),
                )
            })?;

            return resp.json().await.map_err(|e| {
                Self::make_error(
                    format!("quoteSummary({}) invalid JSON: {}", ticker, e),
                    Some(e.into()),
                )
            });
        }
    }

    async fn fetch_chart(
        &self,
        ticker: &Ticker,
        period1: i64,
        period2: i64,
    ) -> AppResult<ChartResult> {
        let path = format!(
            "{}/v8/finance/chart/{}",
            self.quote_base_url,
            urlencoding::encode(ticker.as_str())
        );
        let (period1, period2) = (period1.to_string(), period2.to_string());
        let url = Self::endpoint(
            &path,
            &[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
            ],
        )?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                Self::make_error(
                    format!("chart({}) request failed: {}", ticker, e),
                    Some(e.into()),
                )
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Self::not_found(ticker));
        }

        let data: ChartResponse = resp
            .error_for_status()
            .map_err(|e| {
                Self::make_error(
                    format!("chart({}) HTTP error: {}", ticker, e),
                    Some(e.into()),
                )
            })?
            .json()
            .await
            .map_err(|e| {
                Self::make_error(
                    format!("chart({}) invalid JSON: {}", ticker, e),
                    Some(e.into()),
                )
            })?;

        if let Some(err) = data.chart.error {
            if err.is_not_found() {
                return Err(Self::not_found(ticker));
            }
            return Err(Self::make_error(
                format!("chart({}) API error {}: {}", ticker, err.code, err.description),
                None,
            ));
        }

        data.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| Self::not_found(ticker))
    }
}

fn utc_midnight(date: Date) -> AppResult<i64> {
    date.to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp().as_second())
        .map_err(|e| AppError::bad_request(format!("date {} out of range: {}", date, e)))
}

#[async_trait]
impl TickerDataProvider for YahooFinance {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn get_info(&self, ticker: &Ticker) -> AppResult<TickerInfo> {
        let data = self.fetch_summary(ticker).await?;

        if let Some(err) = data.quote_summary.error {
            if err.is_not_found() {
                return Err(Self::not_found(ticker));
            }
            return Err(Self::make_error(
                format!("quoteSummary({}) API error {}: {}", ticker, err.code, err.description),
                None,
            ));
        }

        let summary = data
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| Self::not_found(ticker))?;

        let now = Timestamp::now();
        let today = now.to_zoned(TimeZone::UTC).date();
        let period1 = utc_midnight(today.saturating_sub(RANGE_LOOKBACK_DAYS.days()))?;
        let bars = match self.fetch_chart(ticker, period1, now.as_second()).await {
            Ok(chart) => daily_bars(&chart),
            Err(AppError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        build_ticker_info(ticker, &summary, &bars, today).map_err(|problem| match problem {
            SummaryProblem::Empty => Self::not_found(ticker),
            SummaryProblem::NoPrice => {
                Self::make_error(format!("quoteSummary({}) has no price", ticker), None)
            }
        })
    }

    async fn get_close_history(
        &self,
        ticker: &Ticker,
        start: Date,
        end: Date,
    ) -> AppResult<Vec<f64>> {
        let chart = self
            .fetch_chart(ticker, utc_midnight(start)?, utc_midnight(end)?)
            .await?;
        Ok(closes_between(&daily_bars(&chart), start, end))
    }
}
