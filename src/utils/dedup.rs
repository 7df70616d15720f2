//! Deduplication of citations within one paper.
//!
//! A paper often lists the same work twice (a `.bbl` next to an inlined
//! `thebibliography` in the `.tex`). Duplicates are detected on the primary
//! identifier, compared case-insensitively since DOIs are case-insensitive.

use std::collections::HashSet;

use crate::models::{IdentifierKind, ReconciledCitation};

/// Remove repeated citations, keeping the first occurrence of each
pub fn dedup_citations(citations: Vec<ReconciledCitation>) -> Vec<ReconciledCitation> {
    let mut seen: HashSet<(IdentifierKind, String)> = HashSet::new();
    let before = citations.len();

    let unique: Vec<_> = citations
        .into_iter()
        .filter(|c| seen.insert((c.primary.kind, c.primary.value.to_lowercase())))
        .collect();

    if unique.len() < before {
        tracing::debug!("Dropped {} duplicate citations", before - unique.len());
    }
    unique
}
