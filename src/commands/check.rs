use super::{env_passphrase, Context};
use artifact_shield::codec::{artifact_path, EncryptOutcome, ARTIFACT_SUFFIX};
use artifact_shield::error::Result;
use artifact_shield::git::{GitRepo, VersionControl};
use std::path::PathBuf;

/// Pre-commit check: report staged files that carry a classification but are
/// not encrypted, and encrypt them when auto-encrypt is enabled.
///
/// Never fails the commit once the repository is open.
pub fn check(ctx: &Context) -> Result<()> {
    println!("Artifact Shield: checking staged files...");

    let repo = GitRepo::open(".")?;
    let workdir = repo.workdir()?.to_path_buf();

    let staged = match repo.staged_files() {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(error = %e, "could not list staged files");
            Vec::new()
        }
    };
    if staged.is_empty() {
        println!("No files to check");
        return Ok(());
    }

    let codec = ctx.codec().with_delete_original(false);
    let classifier = codec.classifier();

    let mut unencrypted: Vec<(PathBuf, String)> = Vec::new();
    for relative in staged {
        let full = workdir.join(&relative);
        if !full.is_file() || classifier.should_exclude(&relative) {
            continue;
        }
        if relative.to_string_lossy().ends_with(ARTIFACT_SUFFIX) || codec.is_encrypted(&full) {
            continue;
        }
        if let Some(label) = classifier.detect_classification(&full) {
            unencrypted.push((relative, label.to_string()));
        }
    }

    if unencrypted.is_empty() {
        println!("All sensitive files are encrypted");
        return Ok(());
    }

    println!(
        "\nFound {} unencrypted sensitive files:",
        unencrypted.len()
    );
    for (path, label) in &unencrypted {
        println!("  - {} ({})", path.display(), label);
    }

    if !ctx.config.auto_encrypt {
        println!("\nAuto-encrypt is disabled. Encrypt these files before pushing.");
        return Ok(());
    }

    let Some(passphrase) = env_passphrase() else {
        println!("\nAuto-encrypt is enabled but SHIELD_PASSPHRASE is not set; skipping.");
        return Ok(());
    };
    if let Err(e) = ctx.config.validate_passphrase(&passphrase) {
        println!("\nSkipping auto-encrypt: {e}");
        return Ok(());
    }

    for (relative, _) in &unencrypted {
        match codec.encrypt_file_in(&workdir, relative, &passphrase) {
            EncryptOutcome::Encrypted { .. } => {
                let artifact = artifact_path(relative);
                let swapped = repo
                    .stage(&artifact)
                    .and_then(|()| repo.unstage(relative));
                match swapped {
                    Ok(()) => println!("  Encrypted and staged: {}", artifact.display()),
                    Err(e) => println!("  Encrypted {} but could not stage: {}", relative.display(), e),
                }
            }
            other => println!("  Could not encrypt {}: {:?}", relative.display(), other),
        }
    }

    Ok(())
}
