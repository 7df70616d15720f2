//! Remote sources for paper payloads.
//!
//! The only production source is the e-print endpoint ([`EprintSource`]). HTTP
//! access goes through the [`Transport`] trait so the retry loop can be driven
//! by [`MockTransport`] in tests and by [`crate::utils::HttpClient`] otherwise.

mod eprint;
pub mod mock;

pub use eprint::{EprintSource, DEFAULT_EPRINT_URL};
pub use mock::MockTransport;

use async_trait::async_trait;

/// A raw HTTP response, reduced to what the fetch loop looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Value of the `Retry-After` header, if present
    pub retry_after: Option<String>,

    /// Response body, untouched
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A 200 response carrying `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    /// An empty response with the given status
    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: Vec::new(),
        }
    }

    /// Attach a `Retry-After` header value
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }
}

/// Minimal GET interface over HTTP
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Issue a GET request; non-2xx statuses are returned, not raised
    async fn get(&self, url: &str) -> Result<RawResponse, SourceError>;
}

/// Errors that can occur when fetching from a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// A status the fetch loop does not know how to recover from
    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_builders() {
        let response = RawResponse::status(503).with_retry_after("12");
        assert_eq!(response.status, 503);
        assert_eq!(response.retry_after.as_deref(), Some("12"));
        assert!(response.body.is_empty());

        assert_eq!(RawResponse::ok(b"abc".to_vec()).status, 200);
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = SourceError::UnexpectedStatus {
            status: 404,
            url: "http://export.arxiv.org/e-print/0000.00000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected HTTP status 404 for http://export.arxiv.org/e-print/0000.00000"
        );
    }
}
