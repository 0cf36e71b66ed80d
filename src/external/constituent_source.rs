use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConstituentSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("response is not valid UTF-8: {0}")]
    Decode(String),
}

/// Supplies the raw constituent table as CSV text.
#[async_trait]
pub trait ConstituentSource: Send + Sync {
    async fn fetch_table(&self) -> Result<String, ConstituentSourceError>;
}

pub struct HttpConstituentSource {
    client: reqwest::Client,
    url: String,
}

impl HttpConstituentSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl ConstituentSource for HttpConstituentSource {
    async fn fetch_table(&self) -> Result<String, ConstituentSourceError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConstituentSourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ConstituentSourceError::Status(resp.status().as_u16()));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ConstituentSourceError::Network(e.to_string()))?;

        String::from_utf8(bytes.to_vec()).map_err(|e| ConstituentSourceError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use crate::external::fakes::spawn_upstream;

    async fn source_serving(router: Router) -> HttpConstituentSource {
        let base = spawn_upstream(router).await;
        HttpConstituentSource::new(reqwest::Client::new(), format!("{}/constituents.csv", base))
    }

    #[tokio::test]
    async fn test_returns_table_text() {
        let source = source_serving(Router::new().route(
            "/constituents.csv",
            get(|| async { "Symbol,Security,GICS Sector\nMMM,3M,Industrials\n" }),
        ))
        .await;

        let table = source.fetch_table().await.unwrap();
        assert!(table.ends_with("MMM,3M,Industrials\n"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let source = source_serving(Router::new().route(
            "/constituents.csv",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;

        let err = source.fetch_table().await.unwrap_err();
        assert!(matches!(err, ConstituentSourceError::Status(503)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_decode_error() {
        let source = source_serving(Router::new().route(
            "/constituents.csv",
            get(|| async { vec![0x53_u8, 0xff, 0xfe] }),
        ))
        .await;

        let err = source.fetch_table().await.unwrap_err();
        assert!(matches!(err, ConstituentSourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let source =
            HttpConstituentSource::new(reqwest::Client::new(), format!("http://{}/list.csv", addr));

        let err = source.fetch_table().await.unwrap_err();
        assert!(matches!(err, ConstituentSourceError::Network(_)));
    }
}
