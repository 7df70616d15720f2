//! Identifier patterns for bibliography text.
//!
//! DOI matching follows the common Crossref recipe, which catches most but not
//! all DOIs. Preprint identifiers come in two precisions, see [`ArxivPattern`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Precision of the preprint identifier pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArxivPattern {
    /// `\d{4}.\d{4,5}` with any separator, or `category[.XX]/\d{7}`.
    ///
    /// Over-matches: page ranges, dates and DOI fragments with the same shape
    /// are reported too.
    #[default]
    Loose,
    /// Literal dot, a `01`-`12` month in the `yymm` part, and word boundaries
    /// on both ends. Changes matched output compared to `Loose`.
    Strict,
}

impl std::str::FromStr for ArxivPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loose" => Ok(ArxivPattern::Loose),
            "strict" => Ok(ArxivPattern::Strict),
            other => Err(format!("unknown arxiv pattern: {}", other)),
        }
    }
}

static LOOSE_ARXIV: OnceLock<Regex> = OnceLock::new();
static STRICT_ARXIV: OnceLock<Regex> = OnceLock::new();
static DOI: OnceLock<Regex> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    // Patterns are constants; a failure here is a programming error
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {}: {}", pattern, e))
}

impl ArxivPattern {
    fn regex(self) -> &'static Regex {
        match self {
            ArxivPattern::Loose => LOOSE_ARXIV.get_or_init(|| {
                compile(r"(?i)(\d{4}.\d{4,5}|[a-z\-]+(\.[A-Z]{2})?/\d{7})(v\d+)?")
            }),
            ArxivPattern::Strict => STRICT_ARXIV.get_or_init(|| {
                compile(concat!(
                    r"(?i)\b(\d{2}(?:0[1-9]|1[0-2])\.\d{4,5}",
                    r"|[a-z\-]+(\.[A-Z]{2})?/\d{7})(v\d+)?\b"
                ))
            }),
        }
    }
}

fn doi_regex() -> &'static Regex {
    DOI.get_or_init(|| compile(r"(?i)10.\d{4,9}/[-._;()/:a-z0-9A-Z]+"))
}

/// Preprint identifiers in `text`, lower-cased, version suffix removed
pub fn find_arxiv_ids(text: &str, pattern: ArxivPattern) -> BTreeSet<String> {
    pattern
        .regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// DOIs in `text`, as written
pub fn find_dois(text: &str) -> BTreeSet<String> {
    doi_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arxiv_new_style() {
        let ids = find_arxiv_ids(
            r"\bibitem Smith2020 See arXiv:1902.00678 for details.",
            ArxivPattern::Loose,
        );
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["1902.00678"]);
    }

    #[test]
    fn test_arxiv_version_suffix_dropped_and_deduplicated() {
        let ids = find_arxiv_ids(
            "arXiv:2010.07848v2 and again arXiv:2010.07848",
            ArxivPattern::Loose,
        );
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["2010.07848"]);
    }

    #[test]
    fn test_arxiv_legacy_style_lowercased() {
        let ids = find_arxiv_ids(
            "E. Witten, HEP-TH/9211122; also math.GT/0104020v1",
            ArxivPattern::Loose,
        );
        assert!(ids.contains("hep-th/9211122"));
        assert!(ids.contains("math.gt/0104020"));
    }

    #[test]
    fn test_loose_pattern_over_matches() {
        // Known weakness: any 4-sep-4 digit run looks like an identifier
        let ids = find_arxiv_ids("Phys. Rev. D 2019 2345-67890", ArxivPattern::Loose);
        assert!(ids.contains("2019 2345"));
    }

    #[test]
    fn test_strict_pattern() {
        assert!(find_arxiv_ids("Phys. Rev. D 2019 2345-67890", ArxivPattern::Strict).is_empty());
        // Month 23 is not a valid yymm prefix
        assert!(find_arxiv_ids("code 2023.45678", ArxivPattern::Strict).is_empty());
        assert_eq!(
            find_arxiv_ids("arXiv:1711.07930v3", ArxivPattern::Strict)
                .into_iter()
                .collect::<Vec<_>>(),
            vec!["1711.07930"]
        );
        let legacy = find_arxiv_ids("astro-ph/0506288", ArxivPattern::Strict);
        assert!(legacy.contains("astro-ph/0506288"));
    }

    #[test]
    fn test_doi_exact_match() {
        let dois = find_dois("Nature 585, 357 (2020), doi:10.1038/s41586-020-2649-2");
        assert_eq!(
            dois.into_iter().collect::<Vec<_>>(),
            vec!["10.1038/s41586-020-2649-2"]
        );
    }

    #[test]
    fn test_doi_keeps_case_and_deduplicates() {
        let dois = find_dois(
            "10.1103/PhysRevLett.116.061102 https://doi.org/10.1103/PhysRevLett.116.061102",
        );
        assert_eq!(
            dois.into_iter().collect::<Vec<_>>(),
            vec!["10.1103/PhysRevLett.116.061102"]
        );
    }

    #[test]
    fn test_no_identifiers() {
        assert!(find_dois("A. Einstein, Annalen der Physik (1905).").is_empty());
        assert!(find_arxiv_ids("A. Einstein, Annalen der Physik.", ArxivPattern::Loose).is_empty());
    }

    #[test]
    fn test_pattern_from_str() {
        assert_eq!("STRICT".parse::<ArxivPattern>().unwrap(), ArxivPattern::Strict);
        assert!("fuzzy".parse::<ArxivPattern>().is_err());
    }
}
