use std::time::Duration;

use crate::external::market_data::{ExternalBar, MarketDataError, MarketDataProvider};
use crate::models::CompanyProfile;
use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;
use url::Url;

/// Yahoo rejects requests without a browser-like user agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; TickerProxy/0.1)";

const FINANCE_REFERER: &str = "https://finance.yahoo.com/";

#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    pub chart_url: String,
    pub summary_url: String,
    /// Hands out the session cookie the crumb is tied to.
    pub cookie_url: String,
    pub crumb_url: String,
}

/// Yahoo Finance provider - free API, no key required.
///
/// Bars, the last traded price and the display names come from the v8 chart
/// endpoint. Sector needs the v10 quote summary, which only answers with a
/// session cookie plus the matching crumb token.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    endpoints: YahooEndpoints,
    timeout: Duration,
}

impl YahooFinanceProvider {
    pub fn new(client: reqwest::Client, endpoints: YahooEndpoints, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<YahooResult>, MarketDataError> {
        let url = ticker_url(&self.endpoints.chart_url, ticker)?;
        let body: YahooChartResponse = get_json(&self.client, url, query).await?;
        first_chart_result(body)
    }

    // A fresh cookie jar per lookup, so no session outlives the request.
    fn session_client(&self) -> Result<reqwest::Client, MarketDataError> {
        reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))
    }

    async fn fetch_crumb(&self, session: &reqwest::Client) -> Result<String, MarketDataError> {
        // fc.yahoo.com answers 404 but still sets the cookie, so only transport errors count.
        session
            .get(&self.endpoints.cookie_url)
            .header(REFERER, FINANCE_REFERER)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let resp = session
            .get(&self.endpoints.crumb_url)
            .header(REFERER, FINANCE_REFERER)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;
        let crumb = check_status(resp)
            .await?
            .text()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let crumb = crumb.trim();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(MarketDataError::BadResponse("no crumb in response".into()));
        }
        Ok(crumb.to_string())
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        let url = ticker_url(&self.endpoints.summary_url, ticker)?;
        let session = self.session_client()?;
        let crumb = self.fetch_crumb(&session).await?;

        let body: YahooSummaryResponse = get_json(
            &session,
            url,
            &[("modules", "price,assetProfile"), ("crumb", crumb.as_str())],
        )
        .await?;
        profile_from_summary(body)
    }
}

/// `base/<ticker>` with the ticker as one escaped path segment, so `/`, `?`
/// and `#` in client input can't change the upstream path or query.
fn ticker_url(base: &str, ticker: &str) -> Result<Url, MarketDataError> {
    if matches!(ticker, "" | "." | "..") {
        return Err(MarketDataError::NotFound);
    }
    let mut url = Url::parse(base)
        .map_err(|e| MarketDataError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| MarketDataError::InvalidUrl(format!("{} cannot take a path", base)))?
        .pop_if_empty()
        .push(ticker);
    Ok(url)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, MarketDataError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(MarketDataError::NotFound);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketDataError::RateLimited);
    }
    if status == StatusCode::UNAUTHORIZED {
        let body = resp.text().await.unwrap_or_default();
        return Err(unauthorized_from_body(&body));
    }
    Err(MarketDataError::BadResponse(format!("HTTP {}", status)))
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    query: &[(&str, &str)],
) -> Result<T, MarketDataError> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| MarketDataError::Network(e.to_string()))?;

    check_status(resp)
        .await?
        .json::<T>()
        .await
        .map_err(|e| MarketDataError::Parse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
    // Seconds east of UTC for the listing exchange.
    #[serde(default, rename = "gmtoffset")]
    gmt_offset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResponse {
    quote_summary: YahooSummary,
}

#[derive(Debug, Deserialize)]
struct YahooSummary {
    result: Option<Vec<YahooSummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResult {
    price: Option<YahooSummaryPrice>,
    asset_profile: Option<YahooAssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryPrice {
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooAssetProfile {
    sector: Option<String>,
}

// Body of a 401 from the quote summary, e.g. an invalid crumb.
#[derive(Debug, Deserialize)]
struct YahooFinanceErrorResponse {
    finance: YahooFinanceEnvelope,
}

#[derive(Debug, Deserialize)]
struct YahooFinanceEnvelope {
    error: Option<YahooError>,
}

fn unauthorized_from_body(body: &str) -> MarketDataError {
    let description = serde_json::from_str::<YahooFinanceErrorResponse>(body)
        .ok()
        .and_then(|r| r.finance.error)
        .map(|e| e.description)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "HTTP 401".to_string());
    MarketDataError::Unauthorized(description)
}

fn api_error(error: YahooError) -> MarketDataError {
    let not_found = error.code.as_deref() == Some("Not Found")
        || error.description.contains("No data found");
    if not_found {
        MarketDataError::NotFound
    } else {
        MarketDataError::BadResponse(error.description)
    }
}

fn first_chart_result(body: YahooChartResponse) -> Result<Option<YahooResult>, MarketDataError> {
    if let Some(error) = body.chart.error {
        return Err(api_error(error));
    }
    Ok(body.chart.result.and_then(|results| results.into_iter().next()))
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// Turns a chart result into adjusted bars sorted oldest first.
///
/// When an adjusted close is present it replaces the close, and open/high/low
/// are scaled by the same factor so the whole bar is on one price basis.
fn bars_from_result(result: YahooResult) -> Result<Vec<ExternalBar>, MarketDataError> {
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjcloses = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let date = ts
            .checked_add(result.meta.gmt_offset)
            .and_then(|local| chrono::DateTime::from_timestamp(local, 0))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| MarketDataError::Parse(format!("bad timestamp {}", ts)))?;

        let raw_close = value_at(&quote.close, i);
        let adj_close = value_at(&adjcloses, i);
        let factor = match (adj_close, raw_close) {
            (Some(adj), Some(raw)) if raw != 0.0 => adj / raw,
            _ => 1.0,
        };
        let scaled = |v: Option<f64>| v.map(|v| v * factor).filter(|v| v.is_finite());

        bars.push(ExternalBar {
            date,
            open: scaled(value_at(&quote.open, i)),
            high: scaled(value_at(&quote.high, i)),
            low: scaled(value_at(&quote.low, i)),
            close: adj_close.or(raw_close),
            volume: value_at(&quote.volume, i)
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn profile_from_summary(body: YahooSummaryResponse) -> Result<CompanyProfile, MarketDataError> {
    if let Some(error) = body.quote_summary.error {
        return Err(api_error(error));
    }
    let result = body
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(MarketDataError::NotFound)?;

    let (short_name, long_name) = result
        .price
        .map(|p| (p.short_name, p.long_name))
        .unwrap_or((None, None));

    Ok(CompanyProfile {
        short_name,
        long_name,
        sector: result.asset_profile.and_then(|a| a.sector),
    })
}

fn profile_from_chart(result: Option<YahooResult>) -> CompanyProfile {
    result
        .map(|r| CompanyProfile {
            short_name: r.meta.short_name,
            long_name: r.meta.long_name,
            sector: None,
        })
        .unwrap_or_default()
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<ExternalBar>, MarketDataError> {
        let result = self
            .fetch_chart(
                ticker,
                &[
                    ("range", period),
                    ("interval", interval),
                    ("includeAdjustedClose", "true"),
                    ("events", "div,splits"),
                ],
            )
            .await?;

        match result {
            Some(result) => bars_from_result(result),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_last_price(&self, ticker: &str) -> Result<Option<f64>, MarketDataError> {
        let result = self
            .fetch_chart(ticker, &[("range", "1d"), ("interval", "1d")])
            .await?;

        Ok(result
            .and_then(|r| r.meta.regular_market_price)
            .filter(|p| p.is_finite()))
    }

    /// Names from the chart metadata, filled in with the quote summary when
    /// the crumb handshake works. Fails only when both sources fail.
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        let (from_chart, from_summary) = tokio::join!(
            self.fetch_chart(ticker, &[("range", "1d"), ("interval", "1d")]),
            self.fetch_summary(ticker),
        );

        match (from_summary, from_chart) {
            (Ok(summary), Ok(chart)) => Ok(summary.or_fill(profile_from_chart(chart))),
            (Ok(summary), Err(_)) => Ok(summary),
            (Err(e), Ok(chart)) => {
                warn!("Quote summary unavailable for {}: {}", ticker, e);
                Ok(profile_from_chart(chart))
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}
