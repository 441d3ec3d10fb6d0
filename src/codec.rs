//! # File Codec
//!
//! Encrypts and decrypts single files on disk.
//!
//! - `path` → `path.enc` on encrypt; the plaintext stays unless deletion is enabled
//! - `path.enc` → `path` on decrypt; the artifact is removed on success
//!
//! Neither operation returns an error. Every branch ends in an outcome value
//! and an audit event, so a scan over thousands of files keeps going when one
//! of them is unreadable.

use crate::audit::AuditSink;
use crate::classify::Classifier;
use crate::config::ShieldConfig;
use crate::crypto::CipherEngine;
use crate::error::Result;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ARTIFACT_SUFFIX: &str = ".enc";

/// Bytes inspected when checking for an existing marker
pub const HEADER_WINDOW_LEN: usize = 100;

/// Location of this module's source, protected from self-encryption
pub(crate) const SOURCE_PATH: &str = file!();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptOutcome {
    /// Artifact written
    Encrypted {
        artifact: PathBuf,
        original_removed: bool,
    },
    /// File already carries the marker; nothing written
    AlreadyEncrypted,
    /// Path matched an exclusion rule
    Excluded,
    Failed(String),
}

impl EncryptOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Encrypted { .. } | Self::AlreadyEncrypted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    Decrypted { restored: PathBuf },
    /// Path does not end in the artifact suffix
    NotAnArtifact,
    /// Wrong passphrase, foreign marker or malformed frame
    Rejected,
    Failed(String),
}

impl DecryptOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Decrypted { .. })
    }
}

/// Path of the artifact produced for `path`
pub fn artifact_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(ARTIFACT_SUFFIX);
    PathBuf::from(name)
}

/// Path restored from `artifact`, if it carries the artifact suffix
pub fn plaintext_path(artifact: &Path) -> Option<PathBuf> {
    let name = artifact.to_str()?;
    let stripped = name.strip_suffix(ARTIFACT_SUFFIX)?;
    if stripped.is_empty() || stripped.ends_with(std::path::MAIN_SEPARATOR) {
        return None;
    }
    Some(PathBuf::from(stripped))
}

pub struct FileCodec {
    engine: CipherEngine,
    classifier: Classifier,
    delete_original: bool,
    audit: Arc<dyn AuditSink>,
}

impl FileCodec {
    pub fn new(config: &ShieldConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            engine: CipherEngine::new(config.encryption_marker.clone()),
            classifier: Classifier::new(config),
            delete_original: config.deletes_originals(),
            audit,
        }
    }

    /// Override whether plaintext is removed after a successful encrypt
    pub fn with_delete_original(mut self, delete: bool) -> Self {
        self.delete_original = delete;
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Check whether the file's header carries the marker
    pub fn is_encrypted(&self, path: &Path) -> bool {
        let Ok(file) = File::open(path) else {
            return false;
        };
        let mut header = Vec::with_capacity(HEADER_WINDOW_LEN);
        if file
            .take(HEADER_WINDOW_LEN as u64)
            .read_to_end(&mut header)
            .is_err()
        {
            return false;
        }
        self.engine.has_marker(&header)
    }

    /// Encrypt `path` into `path.enc`
    pub fn encrypt_file(&self, path: &Path, passphrase: &str) -> EncryptOutcome {
        self.encrypt_checked(path, path, passphrase)
    }

    /// Encrypt `root/relative`, matching exclusion patterns against `relative`
    /// only, so the directory a repository lives in cannot exclude its files.
    pub fn encrypt_file_in(&self, root: &Path, relative: &Path, passphrase: &str) -> EncryptOutcome {
        self.encrypt_checked(&root.join(relative), relative, passphrase)
    }

    fn encrypt_checked(&self, path: &Path, rule_path: &Path, passphrase: &str) -> EncryptOutcome {
        if self.classifier.should_exclude(rule_path) {
            self.audit
                .record(&format!("Skipped (excluded): {}", path.display()));
            return EncryptOutcome::Excluded;
        }

        if self.is_encrypted(path) {
            self.audit
                .record(&format!("Already encrypted: {}", path.display()));
            return EncryptOutcome::AlreadyEncrypted;
        }

        match self.try_encrypt(path, passphrase) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "encryption failed");
                self.audit
                    .record(&format!("Encryption error for {}: {}", path.display(), e));
                EncryptOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_encrypt(&self, path: &Path, passphrase: &str) -> Result<EncryptOutcome> {
        let plaintext = fs::read(path)?;
        let package = self.engine.encrypt(&plaintext, passphrase);

        let artifact = artifact_path(path);
        fs::write(&artifact, package)?;

        let mut original_removed = false;
        if self.delete_original {
            match fs::remove_file(path) {
                Ok(()) => original_removed = true,
                Err(e) => self.audit.record(&format!(
                    "Failed to remove original {}: {}",
                    path.display(),
                    e
                )),
            }
        }

        self.audit.record(&format!(
            "Encrypted: {} -> {}",
            path.display(),
            artifact.display()
        ));
        tracing::debug!(path = %path.display(), artifact = %artifact.display(), "encrypted");

        Ok(EncryptOutcome::Encrypted {
            artifact,
            original_removed,
        })
    }

    /// Decrypt `path.enc` back into `path` and remove the artifact
    pub fn decrypt_file(&self, path: &Path, passphrase: &str) -> DecryptOutcome {
        let Some(restored) = plaintext_path(path) else {
            self.audit
                .record(&format!("Not an encrypted file: {}", path.display()));
            return DecryptOutcome::NotAnArtifact;
        };

        match self.try_decrypt(path, &restored, passphrase) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "decryption failed");
                self.audit
                    .record(&format!("Decryption error for {}: {}", path.display(), e));
                DecryptOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_decrypt(&self, path: &Path, restored: &Path, passphrase: &str) -> Result<DecryptOutcome> {
        let package = fs::read(path)?;

        let Some(plaintext) = self.engine.decrypt(&package, passphrase) else {
            self.audit.record(&format!(
                "Decryption failed: {} (wrong passphrase?)",
                path.display()
            ));
            return Ok(DecryptOutcome::Rejected);
        };

        fs::write(restored, plaintext)?;
        fs::remove_file(path)?;

        self.audit.record(&format!(
            "Decrypted: {} -> {}",
            path.display(),
            restored.display()
        ));

        Ok(DecryptOutcome::Decrypted {
            restored: restored.to_path_buf(),
        })
    }
}
