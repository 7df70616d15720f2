//! Batch processing: fetch, unpack, select, extract and record, one paper at a time.

use serde::Serialize;
use std::path::PathBuf;

use crate::archive::{self, select_candidates, ArchiveError, UnpackOutcome};
use crate::config::Config;
use crate::extract::CitationExtractor;
use crate::models::{CitationEdges, PaperId, PaperWorkspace};
use crate::sink::{CitationSink, SinkError};
use crate::sources::{EprintSource, SourceError};
use crate::utils::{FetchOutcome, ValidationError};

/// Errors that abort processing of a paper
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// How processing of one paper ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaperStatus {
    /// Edges were recorded
    Cited { count: usize },
    /// The payload unpacked but held no candidate files
    NoSources,
    /// The server refused the request (403)
    Forbidden,
    /// Every attempt got a 503
    RetriesExhausted { attempts: u32 },
    /// The payload is a document without sources
    Unsupported,
    /// An error was isolated to this paper
    Failed { message: String },
}

impl PaperStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, PaperStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperOutcome {
    /// The identifier as given, which may not have parsed
    pub paper: String,
    #[serde(flatten)]
    pub status: PaperStatus,
}

/// Outcomes of a batch, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<PaperOutcome>,
}

impl BatchReport {
    /// Papers whose edges were recorded
    pub fn cited(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PaperStatus::Cited { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PaperOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    pub fn total_citations(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                PaperStatus::Cited { count } => count,
                _ => 0,
            })
            .sum()
    }
}

/// Runs the extraction for a list of papers
#[derive(Debug, Clone)]
pub struct BatchRunner {
    source: EprintSource,
    extractor: CitationExtractor,
    root: PathBuf,
    extensions: Vec<String>,
    keep_files: bool,
    fail_fast: bool,
}

impl BatchRunner {
    /// Create a runner fetching over HTTP
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let source = EprintSource::new(&config.fetch)?;
        Ok(Self::with_source(source, config))
    }

    /// Create with a custom source (for testing)
    pub fn with_source(source: EprintSource, config: &Config) -> Self {
        Self {
            source,
            extractor: CitationExtractor::from_config(&config.extraction),
            root: config.workspace.root.clone(),
            extensions: config.extraction.extensions.clone(),
            keep_files: config.workspace.keep_files,
            fail_fast: config.batch.fail_fast,
        }
    }

    pub fn keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Process one paper and remove its working files afterwards
    ///
    /// Files are kept when `keep_files` is set, whatever the outcome.
    pub async fn process_paper(
        &self,
        paper: &PaperId,
        sink: &mut dyn CitationSink,
    ) -> Result<PaperStatus, PipelineError> {
        let workspace = PaperWorkspace::new(&self.root, paper);
        let result = self.extract_paper(paper, &workspace, sink).await;

        if !self.keep_files {
            if let Err(e) = workspace.cleanup() {
                tracing::warn!("Failed to clean up {}: {}", workspace.dir().display(), e);
            }
        }
        result
    }

    async fn extract_paper(
        &self,
        paper: &PaperId,
        workspace: &PaperWorkspace,
        sink: &mut dyn CitationSink,
    ) -> Result<PaperStatus, PipelineError> {
        let payload = match self.source.fetch_paper(paper).await? {
            FetchOutcome::Success(bytes) => bytes,
            FetchOutcome::PermanentFailure => {
                tracing::warn!("Access to {} was refused", paper);
                return Ok(PaperStatus::Forbidden);
            }
            FetchOutcome::RetriesExhausted { attempts } => {
                tracing::warn!("Gave up on {} after {} attempts", paper, attempts);
                return Ok(PaperStatus::RetriesExhausted { attempts });
            }
        };

        if archive::unpack(&payload, workspace)? == UnpackOutcome::Unsupported {
            return Ok(PaperStatus::Unsupported);
        }

        let files = select_candidates(workspace.dir(), &self.extensions);
        if files.is_empty() {
            tracing::info!("No source files for {}", paper);
            return Ok(PaperStatus::NoSources);
        }

        let citations = self.extractor.extract_citations(&files)?;
        let count = citations.len();
        sink.record(&CitationEdges::new(paper.clone(), citations))?;

        tracing::info!("{} cites {} papers", paper, count);
        Ok(PaperStatus::Cited { count })
    }

    /// Process `papers` in order, see [`BatchRunner::run_with`]
    pub async fn run(
        &self,
        papers: &[String],
        sink: &mut dyn CitationSink,
    ) -> Result<BatchReport, PipelineError> {
        self.run_with(papers, sink, |_| {}).await
    }

    /// Process `papers` in order, calling `on_progress` after each one
    ///
    /// An error for one paper is logged and recorded in the report unless
    /// `fail_fast` is set, in which case it is returned immediately.
    pub async fn run_with<F>(
        &self,
        papers: &[String],
        sink: &mut dyn CitationSink,
        mut on_progress: F,
    ) -> Result<BatchReport, PipelineError>
    where
        F: FnMut(&PaperOutcome),
    {
        let mut report = BatchReport::default();

        for raw in papers {
            tracing::info!("Processing {}", raw);
            let result = match PaperId::parse(raw) {
                Ok(paper) => self.process_paper(&paper, sink).await,
                Err(e) => Err(e.into()),
            };

            let status = match result {
                Ok(status) => status,
                Err(e) if self.fail_fast => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to process {}: {}", raw, e);
                    PaperStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };

            let outcome = PaperOutcome {
                paper: raw.clone(),
                status,
            };
            on_progress(&outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
