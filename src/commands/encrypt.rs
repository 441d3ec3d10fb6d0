use super::Context;
use artifact_shield::codec::{DecryptOutcome, EncryptOutcome};
use artifact_shield::error::{Result, ShieldError};
use std::fs;
use std::path::Path;
use tempfile::Builder;

/// Encrypt a single file into FILE.enc
pub fn encrypt(ctx: &Context, file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(ShieldError::MissingFile(file.to_path_buf()));
    }

    let passphrase = ctx.passphrase(None, true)?;
    let codec = ctx.codec();

    match codec.encrypt_file(file, &passphrase) {
        EncryptOutcome::Encrypted {
            artifact,
            original_removed,
        } => {
            println!("Encrypted: {} -> {}", file.display(), artifact.display());
            if original_removed {
                println!("Removed plaintext: {}", file.display());
            }
            Ok(())
        }
        EncryptOutcome::AlreadyEncrypted => {
            println!("File is already encrypted: {}", file.display());
            Ok(())
        }
        EncryptOutcome::Excluded => Err(ShieldError::Encryption {
            path: file.to_path_buf(),
            reason: "path matches an exclude pattern".into(),
        }),
        EncryptOutcome::Failed(reason) => Err(ShieldError::Encryption {
            path: file.to_path_buf(),
            reason,
        }),
    }
}

/// Decrypt FILE.enc back into FILE and remove the artifact
pub fn decrypt(ctx: &Context, file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(ShieldError::MissingFile(file.to_path_buf()));
    }

    let passphrase = ctx.passphrase(None, true)?;

    match ctx.codec().decrypt_file(file, &passphrase) {
        DecryptOutcome::Decrypted { restored } => {
            println!("Decrypted: {} -> {}", file.display(), restored.display());
            Ok(())
        }
        DecryptOutcome::NotAnArtifact => Err(ShieldError::Other(format!(
            "Not an encrypted file: {}",
            file.display()
        ))),
        DecryptOutcome::Rejected => Err(ShieldError::Decryption(file.to_path_buf())),
        DecryptOutcome::Failed(reason) => Err(ShieldError::Other(format!(
            "Decryption error for {}: {}",
            file.display(),
            reason
        ))),
    }
}

/// Round-trip a copy of the file through encrypt and decrypt in scratch space
pub fn validate(ctx: &Context, file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(ShieldError::MissingFile(file.to_path_buf()));
    }

    let codec = ctx.codec().with_delete_original(false);
    if codec.is_encrypted(file) {
        return Err(ShieldError::Other(format!(
            "{} is already encrypted",
            file.display()
        )));
    }

    let passphrase = ctx.passphrase(None, true)?;
    println!("Validating round trip for {}...", file.display());

    let scratch = Builder::new().prefix("shield-validate-").tempdir()?;
    let name = file
        .file_name()
        .ok_or_else(|| ShieldError::Other(format!("Invalid file name: {}", file.display())))?;
    let copy = scratch.path().join(name);
    fs::copy(file, &copy)?;

    let artifact = match codec.encrypt_file(&copy, &passphrase) {
        EncryptOutcome::Encrypted { artifact, .. } => artifact,
        EncryptOutcome::Failed(reason) => {
            return Err(ShieldError::Encryption {
                path: file.to_path_buf(),
                reason,
            })
        }
        other => {
            return Err(ShieldError::Encryption {
                path: file.to_path_buf(),
                reason: format!("unexpected outcome {other:?}"),
            })
        }
    };
    fs::remove_file(&copy)?;

    let restored = match codec.decrypt_file(&artifact, &passphrase) {
        DecryptOutcome::Decrypted { restored } => restored,
        _ => return Err(ShieldError::Decryption(file.to_path_buf())),
    };

    if fs::read(&restored)? != fs::read(file)? {
        return Err(ShieldError::VerificationMismatch(file.to_path_buf()));
    }

    println!("Round trip OK: {}", file.display());
    Ok(())
}
