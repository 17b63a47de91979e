//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `ticker` - Ticker query parameters
//! - `health` - Health check responses
//! - `error` - Common error response DTOs

mod error;
mod health;
mod ticker;

pub use error::ErrorResponse;
pub use health::{CacheStatus, ComponentHealth, HealthResponse, HealthStatus};
pub use ticker::HistoryQuery;
