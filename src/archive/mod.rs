//! Unpacking of e-print payloads.
//!
//! The endpoint serves one of three things:
//!
//! - a tar archive, usually gzip-compressed, holding the full submission
//! - a single gzip-compressed `.tex` file
//! - a document without sources (starts with `%P`), which is not processed
//!
//! Tar is tried first; if that fails the payload is treated as one gzip stream.
//! Gzip input may hold several concatenated members, which are decoded as one
//! continuous stream. An empty payload unpacks to an empty single file.

mod select;

pub use select::select_candidates;

use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::models::PaperWorkspace;

/// Leading bytes of payloads that carry no sources
pub const LEGACY_DOCUMENT_MAGIC: &[u8; 2] = b"%P";

/// Name given to the text of a single-file submission
pub const SINGLE_FILE_NAME: &str = "source.tex";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// What [`unpack`] found in the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackOutcome {
    /// A tar archive; `entries` were written below the working directory
    Extracted { entries: usize },
    /// A single compressed file, written to the given path
    SingleFile(PathBuf),
    /// A document format that is recognized but not processed
    Unsupported,
}

/// Errors that can occur while unpacking
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Neither a tar archive nor a gzip stream
    #[error("Payload is neither a tar archive nor a gzip stream: {0}")]
    Corrupt(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Unpack `raw` into the working directory of `workspace`
///
/// The working directory is created if needed, and the payload is written to
/// the workspace archive file before extraction. Removing both afterwards is
/// left to the caller.
pub fn unpack(raw: &[u8], workspace: &PaperWorkspace) -> Result<UnpackOutcome, ArchiveError> {
    let target = workspace.dir();
    fs::create_dir_all(target)?;

    if raw.starts_with(LEGACY_DOCUMENT_MAGIC) {
        tracing::warn!(
            "Payload for {} looks like a document without sources, skipping",
            target.display()
        );
        return Ok(UnpackOutcome::Unsupported);
    }

    fs::write(workspace.archive_path(), raw)?;

    match extract_tar(workspace.archive_path(), target) {
        Ok(entries) if entries > 0 => {
            tracing::debug!("Extracted {} tar entries into {}", entries, target.display());
            return Ok(UnpackOutcome::Extracted { entries });
        }
        Ok(_) => tracing::debug!("Tar archive without entries, trying single gzip stream"),
        Err(e) => tracing::debug!("Not a tar archive ({}), trying single gzip stream", e),
    }

    let mut data = Vec::new();
    if !raw.is_empty() {
        MultiGzDecoder::new(raw)
            .read_to_end(&mut data)
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;
    }

    let path = target.join(SINGLE_FILE_NAME);
    fs::write(&path, data)?;
    tracing::debug!("Wrote single-file source to {}", path.display());
    Ok(UnpackOutcome::SingleFile(path))
}

/// Extract a plain or gzip-compressed tar archive, returning the entry count
///
/// Entries that would land outside `target` are skipped.
fn extract_tar(archive_path: &Path, target: &Path) -> io::Result<usize> {
    let mut file = File::open(archive_path)?;
    let mut magic = [0u8; 2];
    let gzipped = file.read_exact(&mut magic).is_ok() && magic == GZIP_MAGIC;
    file.seek(SeekFrom::Start(0))?;

    let reader: Box<dyn Read> = if gzipped {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut archive = tar::Archive::new(reader);
    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.unpack_in(target)? {
            count += 1;
        } else {
            tracing::warn!(
                "Skipping tar entry outside working directory: {}",
                String::from_utf8_lossy(&entry.path_bytes())
            );
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperId;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn workspace(root: &Path) -> PaperWorkspace {
        PaperWorkspace::new(root, &PaperId::parse("1902.00678").unwrap())
    }

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gzipped_tar() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        let payload = gzip(&tar_bytes(&[
            ("main.tex", r"\input{intro}"),
            ("sections/intro.tex", "Intro"),
            ("refs.bbl", r"\bibitem{a} x"),
        ]));

        let outcome = unpack(&payload, &ws).unwrap();
        assert_eq!(outcome, UnpackOutcome::Extracted { entries: 3 });
        assert_eq!(
            fs::read_to_string(ws.dir().join("sections/intro.tex")).unwrap(),
            "Intro"
        );
        assert_eq!(fs::read(ws.archive_path()).unwrap(), payload);
    }

    #[test]
    fn test_plain_tar() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        let payload = tar_bytes(&[("paper.tex", "body")]);

        assert_eq!(
            unpack(&payload, &ws).unwrap(),
            UnpackOutcome::Extracted { entries: 1 }
        );
        assert!(ws.dir().join("paper.tex").is_file());
    }

    #[test]
    fn test_single_gzip_file() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        let text = "\\documentclass{article}\n\\bibitem{a} arXiv:1902.00678\n".repeat(40);

        let outcome = unpack(&gzip(text.as_bytes()), &ws).unwrap();
        let path = ws.dir().join(SINGLE_FILE_NAME);
        assert_eq!(outcome, UnpackOutcome::SingleFile(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
        assert_eq!(fs::read_dir(ws.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_short_single_gzip_file() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());

        let outcome = unpack(&gzip(b"tiny"), &ws).unwrap();
        assert!(matches!(outcome, UnpackOutcome::SingleFile(_)));
    }

    #[test]
    fn test_concatenated_gzip_members() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        let first = "\\documentclass{article}\n\\begin{thebibliography}{2}\n";
        let second = "\\bibitem{a} arXiv:1902.00678\n\\bibitem{b} hep-th/9211122\n";
        let mut payload = gzip(first.as_bytes());
        payload.extend(gzip(second.as_bytes()));

        let outcome = unpack(&payload, &ws).unwrap();
        let path = ws.dir().join(SINGLE_FILE_NAME);
        assert_eq!(outcome, UnpackOutcome::SingleFile(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}{}", first, second));
    }

    #[test]
    fn test_tar_split_across_gzip_members() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());
        let tar = tar_bytes(&[("main.tex", "body"), ("refs.bbl", r"\bibitem{a} x")]);
        let (head, tail) = tar.split_at(700);
        let mut payload = gzip(head);
        payload.extend(gzip(tail));

        assert_eq!(
            unpack(&payload, &ws).unwrap(),
            UnpackOutcome::Extracted { entries: 2 }
        );
        assert_eq!(
            fs::read_to_string(ws.dir().join("refs.bbl")).unwrap(),
            r"\bibitem{a} x"
        );
    }

    #[test]
    fn test_empty_payload_is_empty_single_file() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());

        let outcome = unpack(b"", &ws).unwrap();
        let path = ws.dir().join(SINGLE_FILE_NAME);
        assert_eq!(outcome, UnpackOutcome::SingleFile(path.clone()));
        assert_eq!(fs::read(&path).unwrap(), Vec::<u8>::new());
        assert!(ws.archive_path().is_file());
    }

    #[test]
    fn test_legacy_document_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());

        let outcome = unpack(b"%PDF-1.4\n%...", &ws).unwrap();
        assert_eq!(outcome, UnpackOutcome::Unsupported);
        assert!(ws.dir().is_dir());
        assert_eq!(fs::read_dir(ws.dir()).unwrap().count(), 0);
        assert!(!ws.archive_path().exists());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());

        let result = unpack(b"this is neither tar nor gzip", &ws);
        assert!(matches!(result, Err(ArchiveError::Corrupt(_))));
    }

    #[test]
    fn test_entries_cannot_escape_working_directory() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path());

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_old();
        let name = b"../evil.tex";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(4);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, &b"evil"[..]).unwrap();
        let mut ok = tar::Header::new_gnu();
        ok.set_size(2);
        ok.set_mode(0o644);
        ok.set_cksum();
        builder.append_data(&mut ok, "ok.tex", &b"ok"[..]).unwrap();
        let payload = builder.into_inner().unwrap();

        assert_eq!(
            unpack(&payload, &ws).unwrap(),
            UnpackOutcome::Extracted { entries: 1 }
        );
        assert!(!root.path().join("evil.tex").exists());
        assert!(ws.dir().join("ok.tex").is_file());
    }
}
