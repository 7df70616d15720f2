//! Input validation for paper identifiers.
//!
//! Identifiers end up both in request URLs and in local directory names, so
//! anything that could escape either is rejected up front.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid paper ID: {0}")]
    InvalidPaperId(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Validate a paper identifier and return it trimmed
///
/// Accepted characters are ASCII alphanumerics plus `.`, `-`, `/` and `:`,
/// which covers both `2301.12345` and `cond-mat/0203121`. Relative path
/// segments and absolute paths are refused. `_` is refused too: it is the
/// separator in workspace names, so allowing it would let two identifiers
/// share a working directory.
pub fn sanitize_paper_id(id: &str) -> Result<String, ValidationError> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::InvalidPaperId("empty ID".to_string()));
    }

    if id.starts_with('/')
        || id.split('/').any(|segment| segment == ".." || segment == ".")
        || id.contains("..")
    {
        return Err(ValidationError::PathTraversal(id.to_string()));
    }

    if let Some(ch) = id
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '/' | ':')))
    {
        let shown = if ch.is_control() {
            "control character".to_string()
        } else {
            format!("character {:?}", ch)
        };
        return Err(ValidationError::InvalidPaperId(format!(
            "{} contains disallowed {}",
            id, shown
        )));
    }

    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_paper_id_valid() {
        assert_eq!(sanitize_paper_id("2301.12345").unwrap(), "2301.12345");
        assert_eq!(sanitize_paper_id(" 1711.07930\n").unwrap(), "1711.07930");
        assert!(sanitize_paper_id("cond-mat/0203121").is_ok());
        assert!(sanitize_paper_id("math.GT/0104020").is_ok());
        assert!(sanitize_paper_id("arxiv:2301.12345").is_ok());
    }

    #[test]
    fn test_sanitize_paper_id_empty() {
        assert!(sanitize_paper_id("").is_err());
        assert!(sanitize_paper_id("   ").is_err());
    }

    #[test]
    fn test_sanitize_paper_id_path_traversal() {
        assert!(matches!(
            sanitize_paper_id("../etc/passwd"),
            Err(ValidationError::PathTraversal(_))
        ));
        assert!(sanitize_paper_id("foo/../../bar").is_err());
        assert!(sanitize_paper_id("/etc/passwd").is_err());
        assert!(sanitize_paper_id("hep-th/./9211122").is_err());
    }

    #[test]
    fn test_sanitize_paper_id_disallowed_chars() {
        assert!(sanitize_paper_id("foo;rm -rf").is_err());
        assert!(sanitize_paper_id("foo|whoami").is_err());
        assert!(sanitize_paper_id("foo$(whoami)").is_err());
        assert!(sanitize_paper_id("1902.00678?x=1").is_err());
        assert!(sanitize_paper_id("1902\u{0}00678").is_err());
    }

    #[test]
    fn test_sanitize_paper_id_rejects_underscore() {
        assert!(matches!(
            sanitize_paper_id("1902_00678"),
            Err(ValidationError::InvalidPaperId(_))
        ));
        assert!(sanitize_paper_id("math_GT_0104020").is_err());
    }
}
