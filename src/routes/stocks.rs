use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use axum::routing::get;
use serde::Deserialize;
use tracing::{info, error, warn};

use crate::errors::AppError;
use crate::models::TickerSeries;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_series))
        .route("/:ticker/info", get(get_info))
}

#[derive(Debug, Default, Deserialize)]
pub struct SeriesParams {
    pub period: Option<String>,
    pub interval: Option<String>,
}

pub async fn get_series(
    Path(ticker): Path<String>,
    Query(params): Query<SeriesParams>,
    State(state): State<AppState>
) -> Result<Json<TickerSeries>, AppError> {
    info!("GET /api/stock/{} - Getting price history", ticker);
    let series = services::ticker_service::get_series(
        state.market_data.as_ref(),
        &ticker,
        params.period.as_deref(),
        params.interval.as_deref(),
    ).await
        .map_err(|e| {
            match &e {
                AppError::NotFound(_) => warn!("No price history for {}", ticker),
                _ => error!("Failed to get price history for {}: {}", ticker, e),
            }
            e
        })?;
    Ok(Json(series))
}

pub async fn get_info(
    Path(ticker): Path<String>,
    State(state): State<AppState>
) -> impl IntoResponse {
    info!("GET /api/stock/{}/info - Getting snapshot", ticker);
    let snapshot = services::ticker_service::get_snapshot(state.market_data.as_ref(), &ticker).await;
    let status = if snapshot.is_degraded() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(snapshot))
}
