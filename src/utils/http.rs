//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::sources::{RawResponse, SourceError, Transport};

/// Shared HTTP client with sensible defaults
///
/// Transparent content decoding is switched off: e-print payloads are gzip
/// streams themselves and have to reach the unpacker byte-for-byte.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(&FetchConfig::default())
    }

    /// Create a client using the timeouts and user agent from `config`
    pub fn with_config(config: &FetchConfig) -> Result<Self, SourceError> {
        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
        });

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<RawResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Ok(RawResponse {
            status,
            retry_after,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_passes_status_and_headers_through() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/e-print/1902.00678")
            .with_status(503)
            .with_header("retry-after", "7")
            .with_body("busy")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .get(&format!("{}/e-print/1902.00678", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.retry_after.as_deref(), Some("7"));
        assert_eq!(response.body, b"busy");
    }

    #[tokio::test]
    async fn test_gzip_body_is_not_decoded() {
        let payload: Vec<u8> = vec![0x1f, 0x8b, 0x08, 0x00, 0x01, 0x02, 0x03];

        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/e-print/1009.3615")
            .with_status(200)
            .with_header("content-encoding", "gzip")
            .with_body(payload.clone())
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .get(&format!("{}/e-print/1009.3615", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, payload);
    }
}
