//! In-memory collaborators for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::external::constituent_source::{ConstituentSource, ConstituentSourceError};
use crate::external::market_data::{ExternalBar, MarketDataError, MarketDataProvider};
use crate::models::CompanyProfile;

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn bar(date: &str, close: Option<f64>) -> ExternalBar {
    ExternalBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: Some(1_000),
    }
}

/// Returns canned answers and records what it was asked for.
/// Out of the box: no history, no fast quote, an empty profile.
pub struct FakeMarketData {
    history: Result<Vec<ExternalBar>, MarketDataError>,
    last_price: Result<Option<f64>, MarketDataError>,
    profile: Result<CompanyProfile, MarketDataError>,
    history_calls: Mutex<Vec<(String, String, String)>>,
    profile_calls: Mutex<Vec<String>>,
}

impl Default for FakeMarketData {
    fn default() -> Self {
        Self {
            history: Ok(Vec::new()),
            last_price: Ok(None),
            profile: Ok(CompanyProfile::default()),
            history_calls: Mutex::new(Vec::new()),
            profile_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeMarketData {
    pub fn with_history(mut self, bars: Vec<ExternalBar>) -> Self {
        self.history = Ok(bars);
        self
    }

    pub fn with_history_error(mut self, err: MarketDataError) -> Self {
        self.history = Err(err);
        self
    }

    pub fn with_last_price(mut self, price: Option<f64>) -> Self {
        self.last_price = Ok(price);
        self
    }

    pub fn with_last_price_error(mut self, err: MarketDataError) -> Self {
        self.last_price = Err(err);
        self
    }

    pub fn with_profile(mut self, profile: CompanyProfile) -> Self {
        self.profile = Ok(profile);
        self
    }

    pub fn with_profile_error(mut self, err: MarketDataError) -> Self {
        self.profile = Err(err);
        self
    }

    pub fn history_calls(&self) -> Vec<(String, String, String)> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn profile_calls(&self) -> Vec<String> {
        self.profile_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<ExternalBar>, MarketDataError> {
        self.history_calls
            .lock()
            .unwrap()
            .push((ticker.to_string(), period.to_string(), interval.to_string()));
        self.history.clone()
    }

    async fn fetch_last_price(&self, _ticker: &str) -> Result<Option<f64>, MarketDataError> {
        self.last_price.clone()
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        self.profile_calls.lock().unwrap().push(ticker.to_string());
        self.profile.clone()
    }
}

pub struct FakeConstituentSource {
    table: Result<String, ConstituentSourceError>,
}

impl FakeConstituentSource {
    pub fn with_table(table: &str) -> Self {
        Self { table: Ok(table.to_string()) }
    }

    pub fn failing(err: ConstituentSourceError) -> Self {
        Self { table: Err(err) }
    }
}

#[async_trait]
impl ConstituentSource for FakeConstituentSource {
    async fn fetch_table(&self) -> Result<String, ConstituentSourceError> {
        self.table.clone()
    }
}
