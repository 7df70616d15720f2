//! # Citation Graph
//!
//! Builds citation edges for arXiv papers from their LaTeX sources.
//!
//! For every paper the source payload is downloaded from the e-print endpoint,
//! unpacked, and each `.bbl`/`.tex` file is scanned for `\bibitem` entries
//! that mention an arXiv identifier or a DOI.
//!
//! ## Architecture
//!
//! - [`sources`]: e-print download behind the [`sources::Transport`] trait
//! - [`archive`]: payload sniffing, extraction and candidate file selection
//! - [`extract`]: text decoding, entry splitting, identifier matching, reconciliation
//! - [`pipeline`]: per-paper orchestration and batch isolation
//! - [`sink`]: where the resulting [`models::CitationEdges`] go
//! - [`models`]: paper identifiers, workspaces and citation records
//! - [`utils`]: HTTP client, 503 retry loop, validation, deduplication
//! - [`config`]: Configuration management

pub mod archive;
pub mod config;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod sink;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use extract::{extract_citations, CitationExtractor, ReconcilePolicy};
pub use models::{CitationEdges, PaperId, ReconciledCitation};
pub use pipeline::{BatchReport, BatchRunner, PipelineError};
pub use sources::EprintSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
