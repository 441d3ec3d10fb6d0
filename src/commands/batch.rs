use super::Context;
use artifact_shield::backup::ZipBackup;
use artifact_shield::batch::{verify_against_backup, BatchCoordinator, BatchOptions};
use artifact_shield::error::{Result, ShieldError};
use artifact_shield::git::GitRepo;
use artifact_shield::manifest::Manifest;
use std::path::{Path, PathBuf};

/// Encrypt, commit, push and verify every sensitive manifest entry
pub fn batch(
    ctx: &Context,
    passphrase: Option<String>,
    manifest_path: &Path,
    remote: String,
    branch: String,
) -> Result<()> {
    let passphrase = ctx.passphrase(passphrase, false)?;

    let repo = GitRepo::open(".")?;
    let workdir = repo.workdir()?.to_path_buf();
    let manifest_path = in_workdir(&workdir, manifest_path);
    let manifest = Manifest::load(&manifest_path)?;

    println!(
        "Batch encrypting {} sensitive files from {}...",
        manifest.sensitive().count(),
        manifest_path.display()
    );

    let backup = ZipBackup::new(&workdir);
    let options = BatchOptions {
        remote,
        branch,
        ..BatchOptions::default()
    };
    let coordinator = BatchCoordinator::new(
        &workdir,
        ctx.codec(),
        &repo,
        &backup,
        &backup,
        ctx.audit.clone(),
    )
    .with_options(options);

    let report = coordinator.run(&manifest, &passphrase);

    if let Some(snapshot) = &report.snapshot {
        println!("Backup: {}", snapshot.display());
    }
    for path in &report.encrypted {
        println!("  Encrypted: {}", path.display());
    }
    for path in &report.verified {
        println!("  Verified: {}", path.display());
    }
    println!("Final state: {:?}", report.state);

    report.into_result()?;
    println!("Batch complete");
    Ok(())
}

/// Compare committed artifacts with a backup archive, reporting every failure
pub fn verify(
    ctx: &Context,
    backup_path: &Path,
    passphrase: Option<String>,
    manifest_path: &Path,
) -> Result<()> {
    if !backup_path.is_file() {
        return Err(ShieldError::MissingFile(backup_path.to_path_buf()));
    }
    let passphrase = ctx.passphrase(passphrase, false)?;

    let workdir = match GitRepo::open(".") {
        Ok(repo) => repo.workdir()?.to_path_buf(),
        Err(_) => std::env::current_dir()?,
    };
    let manifest = Manifest::load(in_workdir(&workdir, manifest_path))?;
    let archive = ZipBackup::new(&workdir);
    let codec = ctx.codec().with_delete_original(false);

    println!("Verifying against {}...", backup_path.display());
    let report = verify_against_backup(
        &workdir,
        &codec,
        &archive,
        backup_path,
        &manifest,
        &passphrase,
    )?;

    for path in &report.verified {
        println!("  OK: {}", path.display());
    }
    for failure in &report.failures {
        println!("  FAILED: {failure}");
    }

    if report.succeeded() {
        println!("All {} files verified", report.verified.len());
        Ok(())
    } else {
        Err(ShieldError::Other(format!(
            "{} of {} files failed verification",
            report.failures.len(),
            report.failures.len() + report.verified.len()
        )))
    }
}

// Manifest entries are relative to the repository root, so the manifest is too
fn in_workdir(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}
