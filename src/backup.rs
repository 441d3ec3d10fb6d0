//! # Backups
//!
//! Snapshots of the working tree taken before a batch mutates anything, and
//! the extraction used by the post-commit verification pass.
//!
//! [`ZipBackup`] writes `backups/shield-backup-<YYYYmmdd-HHMMSS-mmm>.zip` under the
//! repository root. The archive holds every regular file of the working tree
//! except `.git/` and the backups directory itself, stored under its
//! repository-relative path with `/` separators.

use crate::error::{Result, ShieldError};
use chrono::Local;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const BACKUPS_DIR: &str = "backups";
const SNAPSHOT_PREFIX: &str = "shield-backup-";
const SNAPSHOT_EXTENSION: &str = "zip";

/// Source of pre-transaction snapshots
pub trait Backup {
    /// Take a new snapshot and return a reference to it
    fn create_snapshot(&self) -> Result<PathBuf>;

    /// Existing snapshots, most recent first
    fn list_snapshots(&self) -> Result<Vec<PathBuf>>;
}

/// Unpacks a snapshot into a directory
pub trait Archive {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ZipBackup {
    root: PathBuf,
    backups_dir: PathBuf,
}

impl ZipBackup {
    /// Snapshots of `root`, stored in `root/backups`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let backups_dir = root.join(BACKUPS_DIR);
        Self { root, backups_dir }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    fn next_snapshot_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f").to_string();
        let mut path = self
            .backups_dir
            .join(format!("{SNAPSHOT_PREFIX}{stamp}.{SNAPSHOT_EXTENSION}"));

        let mut counter = 1;
        while path.exists() {
            path = self.backups_dir.join(format!(
                "{SNAPSHOT_PREFIX}{stamp}-{counter}.{SNAPSHOT_EXTENSION}"
            ));
            counter += 1;
        }
        path
    }

    fn is_snapshot(path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        name.starts_with(SNAPSHOT_PREFIX)
            && path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION)
    }
}

impl Backup for ZipBackup {
    fn create_snapshot(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.backups_dir)?;
        let target = self.next_snapshot_path();
        let git_dir = self.root.join(".git");

        let mut writer = ZipWriter::new(File::create(&target)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() != git_dir && entry.path() != self.backups_dir);

        let mut count = 0usize;
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| ShieldError::Other(e.to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            writer.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
            count += 1;
        }
        writer.finish()?;

        tracing::info!(snapshot = %target.display(), files = count, "backup created");
        Ok(target)
    }

    fn list_snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && Self::is_snapshot(&path) {
                let modified = entry.metadata()?.modified()?;
                snapshots.push((modified, path));
            }
        }

        snapshots.sort_by(|a, b| b.cmp(a));
        Ok(snapshots.into_iter().map(|(_, path)| path).collect())
    }
}

impl Archive for ZipBackup {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest)?;
        let mut zip = ZipArchive::new(File::open(archive)?)?;
        zip.extract(dest)?;
        Ok(())
    }
}
