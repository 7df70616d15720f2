//! Utility modules supporting the extraction pipeline.
//!
//! - [`HttpClient`]: reqwest-backed [`crate::sources::Transport`]
//! - [`with_status_retry`]: the 503/403 aware fetch loop and its [`FetchOutcome`]
//! - [`sanitize_paper_id`]: identifier validation before it reaches a URL or path
//! - [`dedup_citations`]: drop repeated citations within one paper
//!
//! # Retry on 503
//!
//! ```rust,no_run
//! use citation_graph::sources::Transport;
//! use citation_graph::utils::{with_status_retry, FetchOutcome, HttpClient, RetryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let url = "http://export.arxiv.org/e-print/1902.00678";
//! let outcome = with_status_retry(RetryConfig::default(), url, || client.get(url)).await?;
//! if let FetchOutcome::Success(bytes) = outcome {
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

mod dedup;
mod http;
mod retry;
mod validate;

pub use dedup::dedup_citations;
pub use http::HttpClient;
pub use retry::{
    parse_retry_after, with_status_retry, FetchOutcome, ResponseClass, RetryConfig,
    DEFAULT_RETRY_AFTER,
};
pub use validate::{sanitize_paper_id, ValidationError};
