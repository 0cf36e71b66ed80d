use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::routes::{constituents, health, stocks};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/", get(index))
        .nest("/api/health", health::router())
        .nest("/api/sp500", constituents::router())
        .nest("/api/stock", stocks::router())
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({
        "service": "ticker-proxy",
        "endpoints": [
            "/api/health",
            "/api/sp500",
            "/api/stock/{ticker}?period=1y&interval=1d",
            "/api/stock/{ticker}/info",
        ]
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Endpoint not found" })))
}
