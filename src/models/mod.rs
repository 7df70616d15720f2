//! Core data models for paper identifiers and extracted citations.

mod citation;
mod paper;

pub use citation::{
    BibliographyEntry, CitationEdges, IdentifierCandidate, IdentifierKind, ReconciledCitation,
};
pub use paper::{PaperId, PaperWorkspace};
