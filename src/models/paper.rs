//! Paper identifiers and the per-paper working area on disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::{sanitize_paper_id, ValidationError};

/// Suffix of the temporary archive file written next to the working directory
const ARCHIVE_SUFFIX: &str = "tar";

/// Identifier of a source paper in the preprint repository
///
/// The token is opaque: both the modern (`1902.00678`) and the legacy
/// (`hep-th/9211122`) forms are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    /// Parse an identifier, rejecting tokens that are unsafe to put in a URL or path
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        sanitize_paper_id(raw).map(Self)
    }

    /// The identifier exactly as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe name: `.` becomes `_` and `/` becomes `+`
    ///
    /// Neither replacement can appear in a parsed identifier, so distinct
    /// identifiers always get distinct names.
    pub fn safe_name(&self) -> String {
        self.0.replace('.', "_").replace('/', "+")
    }

    /// Build the e-print URL for this paper below `base_url`
    pub fn eprint_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PaperId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Working directory and temporary archive file for one paper
///
/// ```text
/// <root>/
///   1902_00678/        extracted sources
///   1902_00678.tar     raw payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperWorkspace {
    dir: PathBuf,
    archive_path: PathBuf,
}

impl PaperWorkspace {
    /// Lay out the workspace for `paper` below `root` (nothing is created yet)
    pub fn new(root: &Path, paper: &PaperId) -> Self {
        let base = paper.safe_name();
        Self {
            dir: root.join(&base),
            archive_path: root.join(format!("{}.{}", base, ARCHIVE_SUFFIX)),
        }
    }

    /// Directory the sources are extracted into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Temporary file holding the raw payload
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Remove the archive file and the working directory if they exist
    pub fn cleanup(&self) -> std::io::Result<()> {
        if self.archive_path.exists() {
            tracing::debug!("Deleting archive {}", self.archive_path.display());
            std::fs::remove_file(&self.archive_path)?;
        }
        if self.dir.exists() {
            tracing::debug!("Deleting folder {}", self.dir.display());
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}
