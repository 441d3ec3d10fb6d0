//! Manifest of governed files.
//!
//! A JSON array of entries, paths relative to the repository root:
//!
//! ```json
//! [
//!   { "path": "secrets/a.txt", "sensitive": true },
//!   { "path": "docs/readme.md", "sensitive": false },
//!   { "path": "legal/contract.pdf", "sensitive": true, "classification": "CONFIDENTIAL" }
//! ]
//! ```

use crate::error::{Result, ShieldError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_MANIFEST: &str = "csv-manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

impl ManifestEntry {
    pub fn sensitive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sensitive: true,
            classification: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Validates every entry and strips `.` components, so `./secrets/a.txt`
    /// is stored as `secrets/a.txt`.
    pub fn new(mut entries: Vec<ManifestEntry>) -> Result<Self> {
        for entry in &mut entries {
            entry.path = normalize(&entry.path)?;
        }
        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ShieldError::InvalidManifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Sensitive entries in manifest order
    pub fn sensitive(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(|entry| entry.sensitive)
    }
}

// Entries are joined onto the repository root, handed to the git index and
// used as keys into scratch directories, so they must stay inside the root
// and carry no `.` components.
fn normalize(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ShieldError::InvalidManifest(format!(
                    "path must be relative to the repository root: {}",
                    path.display()
                )))
            }
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(ShieldError::InvalidManifest("empty path".into()));
    }
    Ok(normalized)
}
