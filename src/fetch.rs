//! Blob fetch adapter: one GET per attachment URL.
//!
//! Status 200 resolves with the body bytes. Any other status fails with the
//! raw body attached so callers can fall back to a placeholder. No retry and
//! no timeout; a hung request hangs the returned future until the caller
//! drops it.

use reqwest::{Client, StatusCode};

use crate::config::FetchConfig;
use crate::error::{EmbedError, Result};

#[derive(Debug, Clone, Default)]
pub struct BlobFetcher {
    client: Client,
}

impl BlobFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client (shared connection pool, custom TLS, proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ref agent) = config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and return the response body.
    pub async fn fetch_as_blob(&self, url: &str) -> Result<Vec<u8>> {
        let transport = |source: reqwest::Error| EmbedError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?.to_vec();

        if status == StatusCode::OK {
            tracing::debug!(url, bytes = body.len(), "Fetched blob");
            Ok(body)
        } else {
            tracing::warn!(url, status = status.as_u16(), "Blob fetch failed");
            Err(EmbedError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blob/1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = BlobFetcher::new();
        let body = fetcher
            .fetch_as_blob(&format!("{}/blob/1", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, vec![1u8, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_non_200_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blob/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let err = BlobFetcher::new()
            .fetch_as_blob(&format!("{}/blob/missing", server.uri()))
            .await
            .unwrap_err();
        match &err {
            EmbedError::FetchStatus { status, body, .. } => {
                assert_eq!(*status, 404);
                assert_eq!(body, b"gone");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.response_body(), Some(&b"gone"[..]));
    }

    #[tokio::test]
    async fn test_other_success_codes_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = BlobFetcher::new().fetch_as_blob(&server.uri()).await.unwrap_err();
        assert!(matches!(err, EmbedError::FetchStatus { status: 204, .. }));
    }

    #[tokio::test]
    async fn test_user_agent_only_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", "mailembed-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = FetchConfig {
            user_agent: Some("mailembed-test".to_string()),
        };
        let fetcher = BlobFetcher::from_config(&config).unwrap();
        assert!(fetcher.fetch_as_blob(&server.uri()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is normally closed.
        let err = BlobFetcher::new()
            .fetch_as_blob("http://127.0.0.1:9/blob")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Transport { .. }));
    }
}
