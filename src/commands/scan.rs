use super::Context;
use artifact_shield::error::{Result, ShieldError};
use artifact_shield::scan::{DirectoryScanner, ScanReport};
use std::path::{Path, PathBuf};

/// Encrypt files under each directory, optionally filtered by classification
pub fn scan(
    ctx: &Context,
    dirs: &[PathBuf],
    classification: Option<&str>,
    delete: bool,
) -> Result<()> {
    for dir in dirs {
        if !dir.is_dir() {
            return Err(ShieldError::Other(format!(
                "Directory not found: {}",
                dir.display()
            )));
        }
    }

    let passphrase = ctx.passphrase(None, true)?;
    let mut codec = ctx.codec();
    if delete {
        codec = codec.with_delete_original(!ctx.config.dry_run);
    }
    let scanner = DirectoryScanner::new(&codec);

    let mut total = ScanReport::default();
    for dir in dirs {
        match classification {
            Some(label) => println!("Scanning {} for {} files...", dir.display(), label),
            None => println!("Scanning {}...", dir.display()),
        }
        let report = scanner.scan_and_encrypt(dir, &passphrase, classification);
        println!("  Encrypted: {} files", report.encrypted);
        println!("  Skipped: {} files", report.skipped);
        total += report;
    }

    if dirs.len() > 1 {
        println!(
            "\nTotal: {} encrypted, {} skipped",
            total.encrypted, total.skipped
        );
    }
    Ok(())
}

/// Report encrypted and plaintext files under a directory
pub fn status(ctx: &Context, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(ShieldError::Other(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let codec = ctx.codec();
    let report = DirectoryScanner::new(&codec).status(dir);

    println!("Encryption status for {}:", dir.display());
    println!("  Encrypted: {} files", report.encrypted.len());
    println!("  Plaintext: {} files", report.plaintext.len());

    if !report.plaintext.is_empty() {
        println!("\nUnencrypted files:");
        for path in &report.plaintext {
            println!("  - {}", path.display());
        }
    }
    Ok(())
}
