//! Choosing one identifier per bibliography entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{IdentifierCandidate, ReconciledCitation};

/// Policy for turning the candidate sets of one entry into a citation
///
/// Within each set the lexicographically smallest candidate wins, which keeps
/// the choice stable across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePolicy {
    /// A DOI if there is one, else a preprint identifier
    #[default]
    PreferDoi,
    /// A preprint identifier if there is one, else a DOI
    PreferArxiv,
    /// Only entries with exactly one candidate in total
    RejectAmbiguous,
    /// Primary as `PreferDoi`, every other candidate kept as an alternate
    AllCandidates,
}

impl std::str::FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "prefer-doi" => Ok(ReconcilePolicy::PreferDoi),
            "prefer-arxiv" => Ok(ReconcilePolicy::PreferArxiv),
            "reject-ambiguous" => Ok(ReconcilePolicy::RejectAmbiguous),
            "all-candidates" => Ok(ReconcilePolicy::AllCandidates),
            other => Err(format!("unknown reconcile policy: {}", other)),
        }
    }
}

impl ReconcilePolicy {
    /// Reconcile the preprint and DOI candidates of one entry
    pub fn reconcile(
        self,
        arxiv_ids: &BTreeSet<String>,
        dois: &BTreeSet<String>,
    ) -> Option<ReconciledCitation> {
        let first_doi = || dois.iter().next().map(IdentifierCandidate::doi);
        let first_arxiv = || arxiv_ids.iter().next().map(IdentifierCandidate::arxiv);

        match self {
            ReconcilePolicy::PreferDoi => {
                first_doi().or_else(first_arxiv).map(ReconciledCitation::new)
            }
            ReconcilePolicy::PreferArxiv => {
                first_arxiv().or_else(first_doi).map(ReconciledCitation::new)
            }
            ReconcilePolicy::RejectAmbiguous => {
                if arxiv_ids.len() + dois.len() == 1 {
                    first_doi().or_else(first_arxiv).map(ReconciledCitation::new)
                } else {
                    None
                }
            }
            ReconcilePolicy::AllCandidates => {
                let primary = first_doi().or_else(first_arxiv)?;
                let alternates = dois
                    .iter()
                    .map(IdentifierCandidate::doi)
                    .chain(arxiv_ids.iter().map(IdentifierCandidate::arxiv))
                    .filter(|c| *c != primary)
                    .collect();
                Some(ReconciledCitation::new(primary).with_alternates(alternates))
            }
        }
    }
}
