use axum::extract::State;
use axum::{Json, Router};
use axum::routing::get;
use tracing::{info, error};

use crate::errors::AppError;
use crate::models::ConstituentRecord;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_constituents))
}

pub async fn get_constituents(
    State(state): State<AppState>
) -> Result<Json<Vec<ConstituentRecord>>, AppError> {
    info!("GET /api/sp500 - Fetching constituent list");
    let records = services::constituent_service::fetch_constituents(state.constituent_source.as_ref()).await
        .map_err(|e| {
            error!("Failed to fetch constituent list: {}", e);
            e
        })?;
    Ok(Json(records))
}
