//! Citation extraction from LaTeX sources.
//!
//! Every candidate file is decoded, cut into bibliography entries at the entry
//! marker (`\bibitem`), and each entry is scanned for preprint identifiers and
//! DOIs. A [`ReconcilePolicy`] then picks at most one citation per entry.
//!
//! ```rust
//! use citation_graph::extract::{split_entries, CitationExtractor};
//!
//! let text = r"\begin{thebibliography}{9}
//! \bibitem{a} A. Author, arXiv:1902.00678
//! \bibitem{b} B. Author, doi:10.1038/s41586-020-2649-2
//! \end{thebibliography}";
//!
//! assert_eq!(split_entries(text, r"\bibitem").len(), 2);
//!
//! let citations = CitationExtractor::default().extract_from_text(text);
//! assert_eq!(citations.len(), 2);
//! ```

mod decode;
mod patterns;
mod reconcile;

pub use decode::{decode_bytes, decode_file, decode_with, detect_encoding};
pub use patterns::{find_arxiv_ids, find_dois, ArxivPattern};
pub use reconcile::ReconcilePolicy;

use std::path::{Path, PathBuf};

use crate::config::ExtractionConfig;
use crate::models::{BibliographyEntry, ReconciledCitation};
use crate::utils::dedup_citations;

/// Split `text` into bibliography entries
///
/// Text before the first `marker` is discarded; each entry runs up to the next
/// marker or the end of the text. Returns nothing if the marker never occurs.
pub fn split_entries<'a>(text: &'a str, marker: &str) -> Vec<BibliographyEntry<'a>> {
    if marker.is_empty() {
        return Vec::new();
    }
    let Some(start) = text.find(marker) else {
        return Vec::new();
    };

    text[start + marker.len()..]
        .split(marker)
        .enumerate()
        .map(|(index, text)| BibliographyEntry { index, text })
        .collect()
}

/// Turns decoded source text into citations
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    marker: String,
    policy: ReconcilePolicy,
    arxiv_pattern: ArxivPattern,
    dedup: bool,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl CitationExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            marker: config.marker.clone(),
            policy: config.policy,
            arxiv_pattern: config.arxiv_pattern,
            dedup: config.dedup,
        }
    }

    pub fn policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn arxiv_pattern(mut self, pattern: ArxivPattern) -> Self {
        self.arxiv_pattern = pattern;
        self
    }

    pub fn dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Citation for a single entry, if the policy yields one
    pub fn reconcile_entry(&self, entry: &BibliographyEntry<'_>) -> Option<ReconciledCitation> {
        let arxiv_ids = find_arxiv_ids(entry.text, self.arxiv_pattern);
        let dois = find_dois(entry.text);
        self.policy.reconcile(&arxiv_ids, &dois)
    }

    /// Citations in one decoded document, in entry order
    pub fn extract_from_text(&self, text: &str) -> Vec<ReconciledCitation> {
        split_entries(text, &self.marker)
            .iter()
            .filter_map(|entry| self.reconcile_entry(entry))
            .collect()
    }

    /// Citations across `files`, in file-then-entry order
    ///
    /// Files without the entry marker contribute nothing. Read errors abort.
    pub fn extract_citations<P: AsRef<Path>>(
        &self,
        files: &[P],
    ) -> std::io::Result<Vec<ReconciledCitation>> {
        let mut citations = Vec::new();

        for file in files {
            let file = file.as_ref();
            let contents = decode_file(file)?;
            if !contents.contains(&self.marker) {
                tracing::debug!("No bibliography entries in {}", file.display());
                continue;
            }

            let found = self.extract_from_text(&contents);
            tracing::debug!("{} citations in {}", found.len(), file.display());
            citations.extend(found);
        }

        if self.dedup {
            citations = dedup_citations(citations);
        }
        Ok(citations)
    }
}

/// Extract citations from `files` with the default settings
pub fn extract_citations(files: &[PathBuf]) -> std::io::Result<Vec<ReconciledCitation>> {
    CitationExtractor::default().extract_citations(files)
}
