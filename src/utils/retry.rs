//! Retry loop for e-print downloads.
//!
//! The endpoint signals overload with `503 Service Unavailable` plus a
//! `Retry-After` header. Those responses are retried after the advertised
//! delay; `403 Forbidden` is final; anything else is handed back as an error.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::sources::{RawResponse, SourceError};

/// Delay used when a 503 carries no usable `Retry-After` header
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of requests, the first one included
    pub max_attempts: u32,
    /// Delay when the server does not say how long to wait
    pub default_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }
}

/// How the fetch loop treats a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx
    Success,
    /// 503, worth waiting for
    Transient,
    /// 403, access will not be granted on a retry
    Permanent,
    /// Anything else
    Unexpected,
}

impl ResponseClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ResponseClass::Success,
            503 => ResponseClass::Transient,
            403 => ResponseClass::Permanent,
            _ => ResponseClass::Unexpected,
        }
    }
}

/// Result of a fetch with retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Payload received
    Success(Vec<u8>),
    /// The server refused access (403); no retry was made
    PermanentFailure,
    /// Every attempt hit a transient error
    RetriesExhausted { attempts: u32 },
}

impl FetchOutcome {
    /// The payload, if the fetch succeeded
    pub fn into_payload(self) -> Option<Vec<u8>> {
        match self {
            FetchOutcome::Success(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Parse a `Retry-After` value given in whole seconds
///
/// HTTP-date values and garbage fall back to `default`.
pub fn parse_retry_after(value: Option<&str>, default: Duration) -> Duration {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Execute a request, retrying on 503 as described in the module docs
///
/// `operation` is called once per attempt. Transport errors are returned as-is
/// without retrying, and so is any status other than 2xx, 403 and 503.
///
/// The attempt count is checked before waiting, so a 503 on the last attempt
/// returns [`FetchOutcome::RetriesExhausted`] at once. Waiting first and
/// checking afterwards would add one more `Retry-After` delay to every
/// exhausted fetch without issuing another request.
pub async fn with_status_retry<F, Fut>(
    config: RetryConfig,
    url: &str,
    operation: F,
) -> Result<FetchOutcome, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RawResponse, SourceError>>,
{
    let mut operation = operation;
    let mut attempts = 0;

    while attempts < config.max_attempts {
        attempts += 1;
        let response = operation().await?;

        match ResponseClass::from_status(response.status) {
            ResponseClass::Success => {
                if attempts > 1 {
                    tracing::info!(
                        "Fetch of {} succeeded on attempt {} after {} transient failures",
                        url,
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(FetchOutcome::Success(response.body));
            }
            ResponseClass::Permanent => {
                tracing::warn!("Got {} for {}, not retrying", response.status, url);
                return Ok(FetchOutcome::PermanentFailure);
            }
            ResponseClass::Unexpected => {
                return Err(SourceError::UnexpectedStatus {
                    status: response.status,
                    url: url.to_string(),
                });
            }
            ResponseClass::Transient => {
                if attempts >= config.max_attempts {
                    break;
                }

                let delay =
                    parse_retry_after(response.retry_after.as_deref(), config.default_retry_after);
                tracing::warn!(
                    "Got {} for {} (attempt {}/{}), retrying after {:?}",
                    response.status,
                    url,
                    attempts,
                    config.max_attempts,
                    delay
                );
                sleep(delay).await;
            }
        }
    }

    tracing::warn!("No success for {} after {} attempts", url, attempts);
    Ok(FetchOutcome::RetriesExhausted { attempts })
}
