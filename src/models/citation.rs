//! Citation records recovered from bibliography text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PaperId;

/// Kind of identifier found in a bibliography entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Preprint repository identifier (`1902.00678`, `hep-th/9211122`)
    Arxiv,
    /// Digital Object Identifier
    Doi,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Arxiv => write!(f, "arxiv"),
            IdentifierKind::Doi => write!(f, "doi"),
        }
    }
}

/// A token matched by one of the identifier patterns
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentifierCandidate {
    pub kind: IdentifierKind,
    pub value: String,
}

impl IdentifierCandidate {
    pub fn arxiv(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Arxiv,
            value: value.into(),
        }
    }

    pub fn doi(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Doi,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for IdentifierCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// One citation record: the text between two entry markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyEntry<'a> {
    /// Position of the entry within its file
    pub index: usize,
    pub text: &'a str,
}

/// The identifier chosen to represent one bibliography entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledCitation {
    pub primary: IdentifierCandidate,

    /// Other candidates from the same entry, only kept by the all-candidates policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<IdentifierCandidate>,
}

impl ReconciledCitation {
    pub fn new(primary: IdentifierCandidate) -> Self {
        Self {
            primary,
            alternates: Vec::new(),
        }
    }

    pub fn with_alternates(mut self, alternates: Vec<IdentifierCandidate>) -> Self {
        self.alternates = alternates;
        self
    }
}

/// Edges from one source paper to everything it cites
///
/// This is the record handed to a [`crate::sink::CitationSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationEdges {
    pub source: PaperId,
    pub citations: Vec<ReconciledCitation>,
    pub extracted_at: DateTime<Utc>,
}

impl CitationEdges {
    pub fn new(source: PaperId, citations: Vec<ReconciledCitation>) -> Self {
        Self {
            source,
            citations,
            extracted_at: Utc::now(),
        }
    }

    /// Primary identifiers in citation order
    pub fn cited_ids(&self) -> impl Iterator<Item = &IdentifierCandidate> {
        self.citations.iter().map(|c| &c.primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_display() {
        assert_eq!(
            IdentifierCandidate::arxiv("1902.00678").to_string(),
            "arxiv:1902.00678"
        );
        assert_eq!(
            IdentifierCandidate::doi("10.1038/nature14539").to_string(),
            "doi:10.1038/nature14539"
        );
    }

    #[test]
    fn test_edges_serialize_without_empty_alternates() {
        let edges = CitationEdges::new(
            PaperId::parse("1902.00678").unwrap(),
            vec![ReconciledCitation::new(IdentifierCandidate::doi(
                "10.1103/PhysRevD.98.030001",
            ))],
        );

        let json = serde_json::to_value(&edges).unwrap();
        assert_eq!(json["source"], "1902.00678");
        assert_eq!(json["citations"][0]["primary"]["kind"], "doi");
        assert!(json["citations"][0].get("alternates").is_none());
        assert_eq!(edges.cited_ids().count(), 1);
    }
}
