//! # Batch Transactions
//!
//! Encrypts every sensitive manifest entry, swaps plaintext for artifacts in
//! version control, commits, pushes, and then proves the pushed artifacts
//! decrypt back to the pre-transaction bytes.
//!
//! ## States
//!
//! ```text
//! Init → Backup → Encrypting ─┬→ Failed → Rollback → Aborted
//!                             └→ Staged → Committed → Verifying ─┬→ Verified → Done
//!                                                                └→ VerifyFailed → ManualReview
//! ```
//!
//! - No snapshot available: the run stops in `Init` before any file is touched.
//! - Any failure while encrypting or staging rolls back: the index is reset,
//!   plaintexts are restored from the safety store and artifacts created by the
//!   run are deleted. Nothing is committed.
//! - Commit and push are never retried. A failure there is reported from
//!   `Staged` or `Committed` and needs a human.
//! - After the push nothing is rolled back; a verification failure ends in
//!   `ManualReview`.
//!
//! The safety store and the verification scratch area are temporary
//! directories released on every exit path, including panics.
//!
//! The coordinator is single-threaded and holds no lock on the working tree;
//! callers must not run two batches against the same repository at once.

use crate::audit::AuditSink;
use crate::backup::{Archive, Backup};
use crate::codec::{artifact_path, DecryptOutcome, EncryptOutcome, FileCodec};
use crate::error::{Result, ShieldError};
use crate::git::VersionControl;
use crate::manifest::{Manifest, ManifestEntry};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{Builder, TempDir};

pub const COMMIT_MESSAGE: &str = "chore(shield): encrypt sensitive files and remove plaintext";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Init,
    Backup,
    Encrypting,
    Failed,
    Rollback,
    Aborted,
    Staged,
    Committed,
    Verifying,
    Verified,
    Done,
    VerifyFailed,
    ManualReview,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub remote: String,
    pub branch: String,
    pub commit_message: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.into(),
            branch: DEFAULT_BRANCH.into(),
            commit_message: COMMIT_MESSAGE.into(),
        }
    }
}

/// Result of one batch run
#[derive(Debug)]
pub struct BatchReport {
    /// Last state reached
    pub state: BatchState,
    /// Every state entered, in order
    pub transitions: Vec<BatchState>,
    /// Snapshot selected for verification
    pub snapshot: Option<PathBuf>,
    /// Entries encrypted and staged, in manifest order
    pub encrypted: Vec<PathBuf>,
    /// Entries whose committed artifact matched the snapshot
    pub verified: Vec<PathBuf>,
    pub error: Option<ShieldError>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            state: BatchState::Init,
            transitions: vec![BatchState::Init],
            snapshot: None,
            encrypted: Vec::new(),
            verified: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == BatchState::Done && self.error.is_none()
    }

    /// Turn a failed run into its error
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Pre-mutation copies of governed files, keyed by repository-relative path
struct SafetyStore {
    dir: TempDir,
    copies: BTreeMap<PathBuf, PathBuf>,
}

impl SafetyStore {
    fn new() -> Result<Self> {
        Ok(Self {
            dir: Builder::new().prefix("shield-").tempdir()?,
            copies: BTreeMap::new(),
        })
    }

    fn preserve(&mut self, relative: &Path, source: &Path) -> Result<()> {
        let copy = self.dir.path().join(relative);
        if let Some(parent) = copy.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &copy)?;
        self.copies.insert(relative.to_path_buf(), copy);
        Ok(())
    }
}

pub struct BatchCoordinator<'a> {
    workdir: PathBuf,
    codec: FileCodec,
    vcs: &'a dyn VersionControl,
    backup: &'a dyn Backup,
    archive: &'a dyn Archive,
    audit: Arc<dyn AuditSink>,
    options: BatchOptions,
}

impl<'a> BatchCoordinator<'a> {
    /// The codec is switched to keep plaintext after encrypting regardless of
    /// its configuration; the coordinator removes plaintext through version
    /// control instead.
    pub fn new(
        workdir: impl AsRef<Path>,
        codec: FileCodec,
        vcs: &'a dyn VersionControl,
        backup: &'a dyn Backup,
        archive: &'a dyn Archive,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            codec: codec.with_delete_original(false),
            vcs,
            backup,
            archive,
            audit,
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the whole transaction for the manifest's sensitive entries
    pub fn run(&self, manifest: &Manifest, passphrase: &str) -> BatchReport {
        let mut report = BatchReport::new();

        self.enter(&mut report, BatchState::Backup);
        let snapshot = match self.select_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.audit.record(&format!("Batch aborted before changes: {e}"));
                report.state = BatchState::Init;
                report.transitions.push(BatchState::Init);
                report.error = Some(e);
                return report;
            }
        };
        self.audit
            .record(&format!("Batch backup selected: {}", snapshot.display()));
        report.snapshot = Some(snapshot.clone());

        let entries: Vec<&ManifestEntry> = manifest.sensitive().collect();
        self.enter(&mut report, BatchState::Encrypting);
        if entries.is_empty() {
            self.audit.record("Batch has no sensitive entries, nothing to do");
            self.enter(&mut report, BatchState::Done);
            return report;
        }

        let mut safety = match SafetyStore::new() {
            Ok(store) => store,
            Err(e) => return self.abort(report, &BTreeMap::new(), &[], e),
        };

        let mut created = Vec::new();
        if let Err(e) = self.encrypt_all(&entries, passphrase, &mut safety, &mut created, &mut report)
        {
            return self.abort(report, &safety.copies, &created, e);
        }
        self.enter(&mut report, BatchState::Staged);

        if let Err(e) = self.vcs.commit(&self.options.commit_message) {
            return self.fatal(report, e);
        }
        self.enter(&mut report, BatchState::Committed);
        self.audit.record("Batch committed");

        if let Err(e) = self.vcs.push(&self.options.remote, &self.options.branch) {
            return self.fatal(report, e);
        }
        self.audit.record(&format!(
            "Batch pushed to {}/{}",
            self.options.remote, self.options.branch
        ));

        self.enter(&mut report, BatchState::Verifying);
        match self.verify(&snapshot, &entries, passphrase, &mut report) {
            Ok(()) => {
                self.enter(&mut report, BatchState::Verified);
                self.audit.record("Batch verification complete");
                self.enter(&mut report, BatchState::Done);
            }
            Err(e) => {
                self.enter(&mut report, BatchState::VerifyFailed);
                self.audit
                    .record(&format!("Verification failed after push, manual review required: {e}"));
                tracing::error!(error = %e, "verification failed after push");
                self.enter(&mut report, BatchState::ManualReview);
                report.error = Some(e);
            }
        }

        report
    }

    fn enter(&self, report: &mut BatchReport, state: BatchState) {
        tracing::debug!(from = ?report.state, to = ?state, "batch transition");
        report.state = state;
        report.transitions.push(state);
    }

    fn select_snapshot(&self) -> Result<PathBuf> {
        if let Err(e) = self.backup.create_snapshot() {
            tracing::warn!(error = %e, "snapshot creation failed");
            self.audit.record(&format!("Backup creation failed: {e}"));
        }
        self.backup
            .list_snapshots()
            .ok()
            .and_then(|snapshots| snapshots.into_iter().next())
            .ok_or(ShieldError::NoBackup)
    }

    fn encrypt_all(
        &self,
        entries: &[&ManifestEntry],
        passphrase: &str,
        safety: &mut SafetyStore,
        created: &mut Vec<PathBuf>,
        report: &mut BatchReport,
    ) -> Result<()> {
        for entry in entries {
            let relative = entry.path.as_path();
            let full = self.workdir.join(relative);
            if !full.is_file() {
                return Err(ShieldError::MissingFile(relative.to_path_buf()));
            }

            safety.preserve(relative, &full)?;

            let artifact = artifact_path(&full);
            let existed = artifact.exists();
            let outcome = self.codec.encrypt_file_in(&self.workdir, relative, passphrase);
            if !existed && artifact.exists() {
                created.push(artifact.clone());
            }

            match outcome {
                EncryptOutcome::Encrypted { .. } | EncryptOutcome::AlreadyEncrypted => {}
                EncryptOutcome::Excluded => {
                    return Err(ShieldError::Encryption {
                        path: relative.to_path_buf(),
                        reason: "path is excluded from encryption".into(),
                    })
                }
                EncryptOutcome::Failed(reason) => {
                    return Err(ShieldError::Encryption {
                        path: relative.to_path_buf(),
                        reason,
                    })
                }
            }
            if !artifact.is_file() {
                return Err(ShieldError::ArtifactMissing(relative.to_path_buf()));
            }

            self.vcs.stage(&artifact_path(relative))?;
            self.vcs.remove(relative)?;

            self.audit
                .record(&format!("Batch staged: {}", artifact_path(relative).display()));
            report.encrypted.push(relative.to_path_buf());
        }
        Ok(())
    }

    fn abort(
        &self,
        mut report: BatchReport,
        copies: &BTreeMap<PathBuf, PathBuf>,
        created: &[PathBuf],
        error: ShieldError,
    ) -> BatchReport {
        tracing::warn!(error = %error, "batch failed, rolling back");
        self.audit
            .record(&format!("Failure during encryption; rolling back: {error}"));
        self.enter(&mut report, BatchState::Failed);
        self.enter(&mut report, BatchState::Rollback);
        self.rollback(copies, created);
        self.enter(&mut report, BatchState::Aborted);
        report.error = Some(error);
        report
    }

    fn rollback(&self, copies: &BTreeMap<PathBuf, PathBuf>, created: &[PathBuf]) {
        if let Err(e) = self.vcs.reset() {
            tracing::warn!(error = %e, "reset during rollback failed");
        }

        for (relative, copy) in copies {
            let full = self.workdir.join(relative);
            if full.exists() {
                continue;
            }
            match fs::copy(copy, &full) {
                Ok(_) => self
                    .audit
                    .record(&format!("Rollback restored: {}", relative.display())),
                Err(e) => {
                    tracing::error!(path = %relative.display(), error = %e, "restore failed");
                    self.audit.record(&format!(
                        "Rollback could not restore {}: {}",
                        relative.display(),
                        e
                    ));
                }
            }
        }

        for artifact in created {
            if let Err(e) = fs::remove_file(artifact) {
                tracing::warn!(path = %artifact.display(), error = %e, "could not remove artifact");
            }
        }
    }

    fn fatal(&self, mut report: BatchReport, error: ShieldError) -> BatchReport {
        tracing::error!(state = ?report.state, error = %error, "batch stopped, manual intervention required");
        self.audit.record(&format!(
            "Batch stopped in {:?}, manual intervention required: {}",
            report.state, error
        ));
        report.error = Some(error);
        report
    }

    /// Check each entry in order, stopping at the first failure
    fn verify(
        &self,
        snapshot: &Path,
        entries: &[&ManifestEntry],
        passphrase: &str,
        report: &mut BatchReport,
    ) -> Result<()> {
        let scratch = Scratch::extract(self.archive, snapshot)?;
        for entry in entries {
            let relative = entry.path.as_path();
            scratch.verify_entry(&self.workdir, &self.codec, relative, passphrase)?;
            self.audit
                .record(&format!("Verified: {}", relative.display()));
            report.verified.push(relative.to_path_buf());
        }
        Ok(())
    }
}

/// Outcome of a standalone verification against a backup archive
#[derive(Debug, Default)]
pub struct VerificationReport {
    pub verified: Vec<PathBuf>,
    pub failures: Vec<ShieldError>,
}

impl VerificationReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check every sensitive manifest entry against `snapshot`, continuing past
/// failures. The working tree is only read.
pub fn verify_against_backup(
    workdir: &Path,
    codec: &FileCodec,
    archive: &dyn Archive,
    snapshot: &Path,
    manifest: &Manifest,
    passphrase: &str,
) -> Result<VerificationReport> {
    let scratch = Scratch::extract(archive, snapshot)?;
    let mut report = VerificationReport::default();

    for entry in manifest.sensitive() {
        let relative = entry.path.as_path();
        match scratch.verify_entry(workdir, codec, relative, passphrase) {
            Ok(()) => report.verified.push(relative.to_path_buf()),
            Err(e) => {
                tracing::warn!(path = %relative.display(), error = %e, "verification failed");
                report.failures.push(e);
            }
        }
    }

    Ok(report)
}

/// Extracted snapshot plus a place to decrypt artifact copies
struct Scratch {
    dir: TempDir,
}

impl Scratch {
    fn extract(archive: &dyn Archive, snapshot: &Path) -> Result<Self> {
        let dir = Builder::new().prefix("shield-verify-").tempdir()?;
        archive.extract(snapshot, &dir.path().join("backup"))?;
        Ok(Self { dir })
    }

    /// Decrypt a copy of the committed artifact and compare it with the
    /// snapshot's version of the file
    fn verify_entry(
        &self,
        workdir: &Path,
        codec: &FileCodec,
        relative: &Path,
        passphrase: &str,
    ) -> Result<()> {
        let expected = self.dir.path().join("backup").join(relative);
        if !expected.is_file() {
            return Err(ShieldError::MissingFile(expected));
        }

        let committed = workdir.join(artifact_path(relative));
        let copy = self.dir.path().join("decrypted").join(artifact_path(relative));
        if let Some(parent) = copy.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&committed, &copy)
            .map_err(|_| ShieldError::ArtifactMissing(relative.to_path_buf()))?;

        let restored = match codec.decrypt_file(&copy, passphrase) {
            DecryptOutcome::Decrypted { restored } => restored,
            _ => return Err(ShieldError::Decryption(relative.to_path_buf())),
        };

        if fs::read(&restored)? != fs::read(&expected)? {
            return Err(ShieldError::VerificationMismatch(relative.to_path_buf()));
        }
        Ok(())
    }
}
