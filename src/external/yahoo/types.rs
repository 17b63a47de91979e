use serde::Deserialize;

/// Numeric fields arrive as `{"raw": 1.23, "fmt": "1.23"}` or as `{}`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Raw<T> {
    pub raw: Option<T>,
}

pub(super) fn raw<T: Copy>(value: &Option<Raw<T>>) -> Option<T> {
    value.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
    }
}

// ============================================================================
// quoteSummary
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: Envelope<QuoteSummaryResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    pub result: Option<Vec<T>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QuoteSummaryResult {
    pub price: Option<PriceModule>,
    pub summary_profile: Option<SummaryProfile>,
    pub summary_detail: Option<SummaryDetail>,
    pub quote_type: Option<QuoteTypeModule>,
    pub calendar_events: Option<CalendarEvents>,
    pub default_key_statistics: Option<KeyStatistics>,
    pub financial_data: Option<FinancialData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PriceModule {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub regular_market_price: Option<Raw<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SummaryProfile {
    pub sector: Option<String>,
    pub sector_disp: Option<String>,
    pub industry: Option<String>,
    pub industry_disp: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SummaryDetail {
    pub dividend_yield: Option<Raw<f64>>,
    pub dividend_rate: Option<Raw<f64>>,
    pub trailing_annual_dividend_rate: Option<Raw<f64>>,
    pub nav_price: Option<Raw<f64>>,
    pub ex_dividend_date: Option<Raw<i64>>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QuoteTypeModule {
    pub quote_type: Option<String>,
    pub short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CalendarEvents {
    pub earnings: Option<Earnings>,
    pub ex_dividend_date: Option<Raw<i64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Earnings {
    #[serde(default)]
    pub earnings_date: Vec<Raw<i64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct KeyStatistics {
    pub last_dividend_value: Option<Raw<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FinancialData {
    pub current_price: Option<Raw<f64>>,
}

// ============================================================================
// chart
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct ChartResponse {
    pub chart: Envelope<ChartResult>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChartMeta {
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct QuoteSeries {
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}
