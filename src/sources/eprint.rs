//! arXiv e-print source archives.

use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::models::PaperId;
use crate::sources::{SourceError, Transport};
use crate::utils::{with_status_retry, FetchOutcome, HttpClient, RetryConfig};

/// Base URL for arXiv e-prints
pub const DEFAULT_EPRINT_URL: &str = "http://export.arxiv.org/e-print";

/// Fetches the raw source payload of a paper
///
/// The payload is whatever the endpoint serves: usually a gzipped tar, sometimes
/// a single gzipped `.tex` file, or a PDF for papers submitted without sources.
#[derive(Debug, Clone)]
pub struct EprintSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryConfig,
}

impl EprintSource {
    /// Create a source backed by a real HTTP client
    pub fn new(config: &FetchConfig) -> Result<Self, SourceError> {
        let client = HttpClient::with_config(config)?;
        Ok(Self::with_transport(Arc::new(client), config))
    }

    /// Create with a custom transport (for testing)
    pub fn with_transport(transport: Arc<dyn Transport>, config: &FetchConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default()
                .max_attempts(config.max_attempts)
                .default_retry_after(Duration::from_secs(config.default_retry_after_secs)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the payload of `paper` is fetched from
    pub fn url_for(&self, paper: &PaperId) -> String {
        paper.eprint_url(&self.base_url)
    }

    /// Fetch `url` with the 503/403 retry policy
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, SourceError> {
        let transport = Arc::clone(&self.transport);
        with_status_retry(self.retry, url, || {
            let transport = Arc::clone(&transport);
            let url = url.to_string();
            async move { transport.get(&url).await }
        })
        .await
    }

    /// Fetch the source payload of `paper`
    pub async fn fetch_paper(&self, paper: &PaperId) -> Result<FetchOutcome, SourceError> {
        let url = self.url_for(paper);
        tracing::debug!("Fetching {}", url);
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockTransport, RawResponse};

    fn config(base_url: &str) -> FetchConfig {
        FetchConfig {
            base_url: base_url.to_string(),
            default_retry_after_secs: 0,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_paper_builds_url() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            "http://mirror/e-print/hep-th/9211122",
            RawResponse::ok(b"data".to_vec()),
        );

        let source =
            EprintSource::with_transport(transport.clone(), &config("http://mirror/e-print/"));
        let paper = PaperId::parse("hep-th/9211122").unwrap();
        let outcome = source.fetch_paper(&paper).await.unwrap();

        assert_eq!(outcome.into_payload(), Some(b"data".to_vec()));
        assert_eq!(transport.requests(), vec!["http://mirror/e-print/hep-th/9211122"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_unavailable() {
        let url = "http://mirror/e-print/1902.00678";
        let transport = Arc::new(MockTransport::new());
        transport
            .push(url, RawResponse::status(503))
            .push(url, RawResponse::status(503))
            .push(url, RawResponse::ok(b"tar".to_vec()));

        let source = EprintSource::with_transport(
            transport.clone(),
            &FetchConfig {
                base_url: "http://mirror/e-print".to_string(),
                ..FetchConfig::default()
            },
        );

        let start = tokio::time::Instant::now();
        let outcome = source.fetch(url).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Success(b"tar".to_vec()));
        assert_eq!(transport.request_count(url), 3);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_fetch_forbidden_makes_one_request() {
        let url = "http://mirror/e-print/1009.3615";
        let transport = Arc::new(MockTransport::new());
        transport.push(url, RawResponse::status(403));

        let source =
            EprintSource::with_transport(transport.clone(), &config("http://mirror/e-print"));
        let outcome = source.fetch(url).await.unwrap();

        assert_eq!(outcome, FetchOutcome::PermanentFailure);
        assert_eq!(transport.request_count(url), 1);
    }

    #[tokio::test]
    async fn test_fetch_over_http_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/e-print/2010.07848")
            .with_status(503)
            .with_header("retry-after", "0")
            .expect(3)
            .create_async()
            .await;

        let source = EprintSource::new(&config(&format!("{}/e-print", server.url()))).unwrap();
        let paper = PaperId::parse("2010.07848").unwrap();
        let outcome = source.fetch_paper(&paper).await.unwrap();

        assert_eq!(outcome, FetchOutcome::RetriesExhausted { attempts: 3 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_over_http_forbidden() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/e-print/1903.12466")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let source = EprintSource::new(&config(&format!("{}/e-print", server.url()))).unwrap();
        let paper = PaperId::parse("1903.12466").unwrap();

        assert_eq!(
            source.fetch_paper(&paper).await.unwrap(),
            FetchOutcome::PermanentFailure
        );
        mock.assert_async().await;
    }
}
