use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::external::constituent_source::ConstituentSourceError;
use crate::external::market_data::MarketDataError;

pub const NO_DATA_MESSAGE: &str = "No data for ticker";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn no_data() -> Self {
        AppError::NotFound(NO_DATA_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<MarketDataError> for AppError {
    fn from(value: MarketDataError) -> Self {
        match value {
            MarketDataError::NotFound => AppError::no_data(),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ConstituentSourceError> for AppError {
    fn from(value: ConstituentSourceError) -> Self {
        AppError::Upstream(value.to_string())
    }
}
