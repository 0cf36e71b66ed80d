use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_CONSTITUENTS_URL: &str =
    "https://datahub.io/core/s-and-p-500-companies/_r/-/data/constituents.csv";
pub const DEFAULT_YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_YAHOO_SUMMARY_URL: &str =
    "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_YAHOO_CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub constituents_url: String,
    pub yahoo_chart_url: String,
    pub yahoo_summary_url: String,
    pub yahoo_cookie_url: String,
    pub yahoo_crumb_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("HOST must be an IP address")?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .context("PORT must be a number between 0 and 65535")?;

        let timeout_secs = lookup("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| "15".to_string())
            .parse::<u64>()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        let config = Self {
            host,
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            constituents_url: lookup("CONSTITUENTS_URL")
                .unwrap_or_else(|| DEFAULT_CONSTITUENTS_URL.to_string()),
            yahoo_chart_url: lookup("YAHOO_CHART_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_CHART_URL.to_string()),
            yahoo_summary_url: lookup("YAHOO_SUMMARY_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_SUMMARY_URL.to_string()),
            yahoo_cookie_url: lookup("YAHOO_COOKIE_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_COOKIE_URL.to_string()),
            yahoo_crumb_url: lookup("YAHOO_CRUMB_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_CRUMB_URL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("CONSTITUENTS_URL", &self.constituents_url),
            ("YAHOO_CHART_URL", &self.yahoo_chart_url),
            ("YAHOO_SUMMARY_URL", &self.yahoo_summary_url),
            ("YAHOO_COOKIE_URL", &self.yahoo_cookie_url),
            ("YAHOO_CRUMB_URL", &self.yahoo_crumb_url),
        ] {
            url::Url::parse(value).with_context(|| format!("{name} is not a valid URL: {value}"))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
