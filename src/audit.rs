//! # Audit Log
//!
//! Append-only event sink shared by every component. Recording an event never
//! fails from the caller's point of view: sinks swallow their own errors so a
//! broken log file cannot interrupt an encryption run.
//!
//! File entries are single lines of the form
//!
//! ```text
//! 2026-01-31T12:00:00.000000+00:00 | Encrypted: secrets/a.txt -> secrets/a.txt.enc
//! ```

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Appends timestamped lines to a file
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `count` entries, oldest first. Missing or unreadable logs read as empty.
    pub fn tail(&self, count: usize) -> Vec<String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let lines: Vec<&str> = contents.lines().collect();
        let start = lines.len().saturating_sub(count);
        lines[start..].iter().map(|line| line.to_string()).collect()
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} | {}", Local::now().to_rfc3339(), message)
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::trace!(path = %self.path.display(), error = %e, "audit write dropped");
        }
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<String>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|event| event.contains(needle))
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(message.to_string());
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLog;

impl AuditSink for NullAuditLog {
    fn record(&self, _message: &str) {}
}
