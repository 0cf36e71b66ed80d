//! Console logging through `tracing`, with Loki shipping when built with the
//! `loki` feature and `LOKI_URL` is set.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,ticker_proxy_backend=debug`.
    pub filter: String,
    pub loki_url: Option<Url>,
    pub service_name: String,
    pub environment: String,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string());
        EnvFilter::try_new(&filter).with_context(|| format!("invalid RUST_LOG filter: {filter}"))?;

        let loki_url = lookup("LOKI_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| Url::parse(&v).with_context(|| format!("LOKI_URL is not a valid URL: {v}")))
            .transpose()?;

        Ok(Self {
            filter,
            loki_url,
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "ticker-proxy".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        })
    }
}

/// Installs the global subscriber. With Loki enabled this must run inside
/// the tokio runtime, since the shipping task is spawned onto it.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid RUST_LOG filter: {}", config.filter))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    #[cfg(feature = "loki")]
    let registry = registry.with(loki_layer(config)?);

    registry
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    match &config.loki_url {
        Some(url) if cfg!(feature = "loki") => {
            info!(service = %config.service_name, "Shipping logs to Loki at {}", url)
        }
        Some(_) => warn!("LOKI_URL is set but this build has no Loki support"),
        None => info!(service = %config.service_name, "Console logging initialized"),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig) -> Result<Option<tracing_loki::Layer>> {
    let Some(url) = config.loki_url.clone() else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)
        .and_then(|b| b.label("environment", &config.environment))
        .and_then(|b| b.build_url(url))
        .map_err(|e| anyhow::anyhow!("failed to build Loki layer: {e}"))?;
    tokio::spawn(task);

    Ok(Some(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<LoggingConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LoggingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_console_only_by_default() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.filter, "info");
        assert_eq!(config.loki_url, None);
        assert_eq!(config.service_name, "ticker-proxy");
    }

    #[test]
    fn test_blank_loki_url_is_ignored() {
        assert_eq!(config_from(&[("LOKI_URL", "  ")]).unwrap().loki_url, None);
    }

    #[test]
    fn test_loki_url_is_parsed() {
        let config = config_from(&[("LOKI_URL", "http://localhost:3100"), ("ENVIRONMENT", "prod")])
            .unwrap();

        assert_eq!(config.loki_url.unwrap().as_str(), "http://localhost:3100/");
        assert_eq!(config.environment, "prod");
    }

    #[test]
    fn test_rejects_bad_loki_url_and_filter() {
        assert!(config_from(&[("LOKI_URL", "localhost 3100")]).is_err());
        assert!(config_from(&[("RUST_LOG", "ticker=loud")]).is_err());
    }
}
