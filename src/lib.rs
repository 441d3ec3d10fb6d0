//! # artifact-shield
//!
//! Passphrase-based protection for sensitive files in a git working tree.
//!
//! ## Features
//!
//! - **File Encryption**: `path` becomes `path.enc`, an artifact recoverable only with the passphrase
//! - **Classification Scans**: Encrypt every file in a tree, or only those tagged `TOP_SECRET`, `CONFIDENTIAL`, ...
//! - **Transactional Batches**: Encrypt, stage, commit and push a manifest of files as one unit, with rollback
//! - **Post-Commit Verification**: Prove every pushed artifact decrypts to the bytes in a pre-transaction backup
//! - **Pre-Commit Check**: Flag staged files that carry a classification label but are not encrypted
//! - **Audit Log**: Append-only record of every encryption decision
//!
//! ## Quick Start
//!
//! ```bash
//! # Encrypt a single file (writes secrets/api.txt.enc)
//! artifact-shield encrypt secrets/api.txt
//!
//! # Decrypt it again (writes secrets/api.txt, removes the artifact)
//! artifact-shield decrypt secrets/api.txt.enc
//!
//! # Encrypt every CONFIDENTIAL file under docs/
//! artifact-shield scan docs --classification CONFIDENTIAL
//!
//! # Encrypt all sensitive manifest entries, commit, push and verify
//! SHIELD_PASSPHRASE=... artifact-shield batch --manifest csv-manifest.json
//! ```
//!
//! ## How It Works
//!
//! ### Artifact Format
//!
//! ```text
//! ARTIFACT_SHIELD_ENCRYPTED::v1.0::<64 hex chars of salt>::<ciphertext>
//! ```
//!
//! A fresh 32-byte salt is drawn for every encryption. The cipher key is
//! derived from `passphrase::salt` with chained SHA3-512, BLAKE2b-512 and
//! SHA-512, and the plaintext is transformed by three length-preserving XOR
//! passes. See [`crypto`] and [`kdf`].
//!
//! ### Batch Flow
//!
//! ```text
//! backup → encrypt each entry → stage .enc / remove plaintext → commit → push → verify
//!                     │
//!                     └─ any failure → reset index, restore plaintexts, abort
//! ```
//!
//! See [`batch`] for the state machine and failure policy.
//!
//! ## Module Overview
//!
//! - [`kdf`] - Passphrase and salt to key material
//! - [`crypto`] - Layered cipher and package framing
//! - [`codec`] - Single-file encrypt/decrypt with exclusion and idempotence rules
//! - [`classify`] - Exclusion patterns and classification markers
//! - [`scan`] - Lazy directory traversal, scans and status reports
//! - [`batch`] - Manifest-driven transactional encryption
//! - [`git`] - Version control operations (`git2`)
//! - [`backup`] - Zip snapshots and extraction
//! - [`manifest`] - Manifest of governed files
//! - [`config`] - Layered configuration
//! - [`audit`] - Audit event sinks
//! - [`error`] - Error types
//!
//! ## Configuration
//!
//! Settings live in `~/.artifact_shield/config.json` and can be overridden with
//! `SHIELD_*` environment variables. See [`config`].
//!
//! ## Security Considerations
//!
//! The cipher exists for compatibility with artifacts produced by earlier
//! versions of this tool. It is **not** an authenticated construction:
//!
//! - a wrong passphrase decrypts to garbage instead of failing
//! - modified ciphertext is not detected; only the marker field is checked
//! - the key stream repeats every 64 bytes within a file
//! - the forward and reverse passes cancel at up to two offsets per 64 bytes,
//!   leaving those bytes under the position mask only
//!
//! Use it to keep casual readers out of a repository, not as a substitute for
//! AEAD encryption when confidentiality or integrity really matter.
//!
//! ## Testing
//!
//! ```bash
//! # Unit tests
//! cargo test --lib
//!
//! # Batch transactions against test doubles
//! cargo test --test batch_test
//!
//! # End-to-end batch against a real repository and remote
//! cargo test --test git_batch_test
//!
//! # CLI
//! cargo test --test cli_test
//!
//! # Property tests
//! cargo test --test properties
//! ```

pub mod audit;
pub mod backup;
pub mod batch;
pub mod classify;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod git;
pub mod kdf;
pub mod manifest;
pub mod scan;

// Re-export commonly used types
pub use audit::{AuditSink, FileAuditLog, MemoryAuditLog, NullAuditLog};
pub use backup::{Archive, Backup, ZipBackup};
pub use batch::{
    verify_against_backup, BatchCoordinator, BatchOptions, BatchReport, BatchState,
    VerificationReport,
};
pub use classify::Classifier;
pub use codec::{DecryptOutcome, EncryptOutcome, FileCodec};
pub use config::{ShieldConfig, ShieldHome};
pub use crypto::CipherEngine;
pub use error::{Result, ShieldError};
pub use git::{GitRepo, VersionControl};
pub use manifest::{Manifest, ManifestEntry};
pub use scan::{DirectoryScanner, FileTree, ScanReport, StatusReport};
