//! Ticker request DTOs.

use std::borrow::Cow;

use jiff::civil::Date;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::{Validate, ValidationError, ValidationErrors};

/// Query for `GET /{ticker}/history`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// First day included (YYYY-MM-DD)
    #[param(value_type = String, format = Date, example = "2024-01-01")]
    pub start: Date,
    /// First day excluded (YYYY-MM-DD)
    #[param(value_type = String, format = Date, example = "2024-02-01")]
    pub end: Date,
}

impl Validate for HistoryQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.start < self.end {
            return Ok(());
        }
        let mut errors = ValidationErrors::new();
        errors.add(
            "start",
            ValidationError::new("range").with_message(Cow::Owned(format!(
                "start ({}) must be before end ({})",
                self.start, self.end
            ))),
        );
        Err(errors)
    }
}
