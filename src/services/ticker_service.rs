use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::market_data::{ExternalBar, MarketDataError, MarketDataProvider};
use crate::models::{CompanyProfile, FieldValue, PricePoint, TickerSeries, TickerSnapshot};

pub const DEFAULT_PERIOD: &str = "1y";
pub const DEFAULT_INTERVAL: &str = "1d";

const SNAPSHOT_FALLBACK_PERIOD: &str = "5d";
const SNAPSHOT_FALLBACK_INTERVAL: &str = "1d";

/// Trimmed and uppercased; every upstream call sees this form.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Blank or missing query values fall back to the default.
fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(default)
}

/// Price history plus a display name for `ticker`.
///
/// No history at all is `NotFound`. The profile lookup is best effort: if it
/// fails the company name is the ticker itself.
pub async fn get_series(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    period: Option<&str>,
    interval: Option<&str>,
) -> Result<TickerSeries, AppError> {
    let ticker = normalize_ticker(ticker);
    if ticker.is_empty() {
        return Err(AppError::no_data());
    }
    let period = or_default(period, DEFAULT_PERIOD);
    let interval = or_default(interval, DEFAULT_INTERVAL);

    let bars = provider.fetch_history(&ticker, period, interval).await?;
    let points = points_from_bars(bars);
    if points.is_empty() {
        return Err(AppError::no_data());
    }

    let profile = profile_or_default(provider, &ticker).await;
    info!("Resolved {} price points for {} ({}/{})", points.len(), ticker, period, interval);

    Ok(TickerSeries {
        company_name: profile.resolve_company_name(&ticker),
        points,
    })
}

/// Current price, name and sector for `ticker`. Never fails: when the price
/// pipeline itself breaks, every field is `"N/A"` and `error` says why.
pub async fn get_snapshot(provider: &dyn MarketDataProvider, ticker: &str) -> TickerSnapshot {
    let ticker = normalize_ticker(ticker);
    if ticker.is_empty() {
        return TickerSnapshot::unavailable("Ticker symbol is empty");
    }

    let current_price = match resolve_current_price(provider, &ticker).await {
        Ok(price) => price,
        Err(e) => {
            warn!("Snapshot for {} failed: {}", ticker, e);
            return TickerSnapshot::unavailable(e.to_string());
        }
    };

    let profile = profile_or_default(provider, &ticker).await;

    TickerSnapshot {
        company_name: profile.resolve_company_name(&ticker),
        current_price,
        sector: profile.resolve_sector(),
        error: None,
    }
}

/// Fast quote first, then the last close of a short daily window.
///
/// A failing fast quote only moves on to the next source; an error is
/// returned only when the history fallback fails too.
pub async fn resolve_current_price(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Result<FieldValue<f64>, MarketDataError> {
    match provider.fetch_last_price(ticker).await {
        Ok(Some(price)) if price.is_finite() => return Ok(FieldValue::Available(price)),
        Ok(_) => {}
        Err(e) => warn!("Fast quote unavailable for {}: {}", ticker, e),
    }

    let bars = match provider
        .fetch_history(ticker, SNAPSHOT_FALLBACK_PERIOD, SNAPSHOT_FALLBACK_INTERVAL)
        .await
    {
        Ok(bars) => bars,
        Err(MarketDataError::NotFound) => Vec::new(),
        Err(e) => return Err(e),
    };

    Ok(FieldValue::finite(
        points_from_bars(bars).last().map(|p| p.price),
    ))
}

async fn profile_or_default(provider: &dyn MarketDataProvider, ticker: &str) -> CompanyProfile {
    provider.fetch_profile(ticker).await.unwrap_or_else(|e| {
        warn!("Company profile unavailable for {}: {}", ticker, e);
        CompanyProfile::default()
    })
}

/// Drops sessions without a usable close and returns the rest oldest first.
fn points_from_bars(bars: Vec<ExternalBar>) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = bars
        .into_iter()
        .filter_map(|bar| {
            let price = bar.close.filter(|c| c.is_finite())?;
            Some(PricePoint {
                date: bar.date,
                price,
                open: FieldValue::finite(bar.open),
                high: FieldValue::finite(bar.high),
                low: FieldValue::finite(bar.low),
                volume: bar.volume.into(),
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points
}
