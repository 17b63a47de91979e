use utoipa::OpenApi;

pub const TICKER_TAG: &str = "Tickers";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ticker Info",
        description = "Company and price information for listed securities, cached with a TTL",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::external::PriceRange,
        )
    ),
    tags(
        (name = TICKER_TAG, description = "Ticker lookup endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
