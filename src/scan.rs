//! # Directory Scanning
//!
//! Walks a tree depth-first and applies the file codec to every regular file,
//! optionally only to files tagged with a classification label.
//!
//! The walk is lazy: [`FileTree::files`] yields paths as directories are read
//! instead of collecting the whole tree first, and can be called again to
//! restart from the root. Entries within a directory are visited in file name
//! order, and each directory is listed before its files are processed, so
//! artifacts written next to a file during the scan are not picked up again.

use crate::codec::{FileCodec, ARTIFACT_SUFFIX};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Restartable sequence of the regular files under a root directory
#[derive(Debug, Clone)]
pub struct FileTree {
    root: PathBuf,
}

impl FileTree {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Regular files, depth-first. Unreadable entries are logged and skipped.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub encrypted: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for ScanReport {
    fn add_assign(&mut self, other: Self) {
        self.encrypted += other.encrypted;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub encrypted: Vec<PathBuf>,
    pub plaintext: Vec<PathBuf>,
}

pub struct DirectoryScanner<'a> {
    codec: &'a FileCodec,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(codec: &'a FileCodec) -> Self {
        Self { codec }
    }

    /// Encrypt every file under `directory`, or only those whose leading text
    /// contains `classification` when one is given.
    ///
    /// Files filtered out by classification are not counted. Codec failures and
    /// exclusions count as skipped.
    pub fn scan_and_encrypt(
        &self,
        directory: &Path,
        passphrase: &str,
        classification: Option<&str>,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for path in FileTree::new(directory).files() {
            if let Some(label) = classification {
                if !self.codec.classifier().has_classification(&path, label) {
                    continue;
                }
            }

            if self.codec.encrypt_file(&path, passphrase).succeeded() {
                report.encrypted += 1;
            } else {
                report.skipped += 1;
            }
        }

        tracing::info!(
            directory = %directory.display(),
            encrypted = report.encrypted,
            skipped = report.skipped,
            "scan finished"
        );
        report
    }

    /// Split the non-excluded files under `directory` into encrypted and plaintext
    pub fn status(&self, directory: &Path) -> StatusReport {
        let mut report = StatusReport::default();

        for path in FileTree::new(directory).files() {
            if self.codec.classifier().should_exclude(&path) {
                continue;
            }

            let is_artifact = path.to_string_lossy().ends_with(ARTIFACT_SUFFIX);
            if is_artifact || self.codec.is_encrypted(&path) {
                report.encrypted.push(path);
            } else {
                report.plaintext.push(path);
            }
        }

        report
    }
}
