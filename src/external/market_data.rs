use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::CompanyProfile;

/// One raw bar as returned by the provider, already split/dividend adjusted.
/// Any field may be missing for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Adjusted bars for `ticker` over `period` at `interval`, oldest first.
    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<ExternalBar>, MarketDataError>;

    /// Last traded price from the provider's low-latency quote, if it has one.
    async fn fetch_last_price(&self, ticker: &str) -> Result<Option<f64>, MarketDataError>;

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError>;
}
