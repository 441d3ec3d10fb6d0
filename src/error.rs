use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShieldError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Encryption failed for {}: {reason}", path.display())]
    Encryption { path: PathBuf, reason: String },

    #[error("Encrypted artifact missing for {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Decryption failed for {} (wrong passphrase or corrupted artifact)", .0.display())]
    Decryption(PathBuf),

    #[error("Verification mismatch for {}", .0.display())]
    VerificationMismatch(PathBuf),

    #[error("No backup snapshot available, aborting")]
    NoBackup,

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Invalid passphrase: {0}")]
    InvalidPassphrase(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Not in a git repository")]
    NotInGitRepo,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ShieldError>;
