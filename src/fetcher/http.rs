//! reqwest-backed page fetcher

use chrono::Utc;
use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::{FetchError, FetchedPage, FetcherConfig, PageFetcher};

/// Fetches pages over HTTP with a fixed user agent and timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Create a fetcher with the default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with a custom configuration
    pub fn with_config(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url)?;
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut html = response.text().await?;
        if html.len() > self.config.max_body_bytes {
            debug!("Truncating {} byte body from {}", html.len(), url);
            let mut end = self.config.max_body_bytes;
            while !html.is_char_boundary(end) {
                end -= 1;
            }
            html.truncate(end);
        }

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            html,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::DEFAULT_USER_AGENT;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/en/programme")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><title>MSc Finance</title></html>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/en/programme", server.url());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.status, 200);
        assert!(page.html.contains("MSc Finance"));
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/no/programme")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch(&format!("{}/no/programme", server.url())).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_truncates_large_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/big")
            .with_status(200)
            .with_body("x".repeat(64))
            .create_async()
            .await;

        let config = FetcherConfig::builder().max_body_bytes(16).build();
        let fetcher = HttpFetcher::with_config(config).unwrap();
        let page = fetcher.fetch(&format!("{}/big", server.url())).await.unwrap();

        assert_eq!(page.html.len(), 16);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::UrlParse(_))));
    }
}
