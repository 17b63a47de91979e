//! Ticker lookup handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::TICKER_TAG;
use crate::api::dto::{ErrorResponse, HistoryQuery};
use crate::error::AppResult;
use crate::external::{Ticker, TickerInfo};
use crate::state::AppState;
use crate::utils::validate::ValidatedQuery;

/// Register ticker routes.
pub fn ticker_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_ticker_info))
        .routes(routes!(get_ticker_history))
}

/// GET /{ticker} - Company and price information, served from cache while fresh.
#[utoipa::path(
    get,
    path = "/{ticker}",
    tag = TICKER_TAG,
    params(
        ("ticker" = String, Path, description = "Ticker symbol, case-insensitive", example = "AAPL")
    ),
    responses(
        (status = 200, description = "Ticker information", body = TickerInfo),
        (status = 400, description = "Invalid ticker symbol", body = ErrorResponse),
        (status = 404, description = "Ticker unknown to the provider", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
async fn get_ticker_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<TickerInfo>> {
    let ticker = Ticker::parse(&symbol)?;
    let info = state.services.tickers.get_info(&ticker).await?;
    Ok(Json(info))
}

/// GET /{ticker}/history - Daily close prices between two dates.
#[utoipa::path(
    get,
    path = "/{ticker}/history",
    tag = TICKER_TAG,
    params(
        ("ticker" = String, Path, description = "Ticker symbol, case-insensitive", example = "AAPL"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Close prices, oldest first", body = Vec<f64>),
        (status = 400, description = "Invalid ticker or date range", body = ErrorResponse),
        (status = 404, description = "Ticker unknown to the provider", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
async fn get_ticker_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> AppResult<Json<Vec<f64>>> {
    let ticker = Ticker::parse(&symbol)?;
    let closes = state
        .services
        .tickers
        .get_close_history(&ticker, query.start, query.end)
        .await?;
    Ok(Json(closes))
}
