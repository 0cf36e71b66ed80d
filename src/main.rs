mod app;
mod config;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::external::constituent_source::HttpConstituentSource;
use crate::external::yahoofinance::{YahooEndpoints, YahooFinanceProvider, USER_AGENT};
use crate::logging::{init_logging, LoggingConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(&LoggingConfig::from_env()?)?;

    let config = AppConfig::from_env()?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.upstream_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let state = AppState {
        market_data: Arc::new(YahooFinanceProvider::new(
            client.clone(),
            YahooEndpoints {
                chart_url: config.yahoo_chart_url.clone(),
                summary_url: config.yahoo_summary_url.clone(),
                cookie_url: config.yahoo_cookie_url.clone(),
                crumb_url: config.yahoo_crumb_url.clone(),
            },
            config.upstream_timeout,
        )),
        constituent_source: Arc::new(HttpConstituentSource::new(
            client,
            config.constituents_url.clone(),
        )),
    };
    let app = app::create_app(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Ticker proxy running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
