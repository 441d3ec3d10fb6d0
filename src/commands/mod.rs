pub mod batch;
pub mod check;
pub mod encrypt;
pub mod info;
pub mod scan;

pub use batch::{batch, verify};
pub use check::check;
pub use encrypt::{decrypt, encrypt, validate};
pub use info::{show_audit, show_config};
pub use scan::{scan, status};

use artifact_shield::config::{ShieldConfig, ShieldHome};
use artifact_shield::error::{Result, ShieldError};
use artifact_shield::{FileAuditLog, FileCodec};
use rpassword::prompt_password;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

pub const PASSPHRASE_ENV: &str = "SHIELD_PASSPHRASE";

/// State shared by every command: where the shield directory lives, the
/// loaded configuration and the audit log.
pub struct Context {
    pub home: ShieldHome,
    pub config: ShieldConfig,
    pub audit: Arc<FileAuditLog>,
}

impl Context {
    pub fn load(home: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let home = match home {
            Some(dir) => ShieldHome::new(dir),
            None => ShieldHome::default_location()?,
        };
        if let Err(e) = home.ensure() {
            tracing::warn!(dir = %home.dir().display(), error = %e, "could not prepare shield directory");
        }

        let config = home.load_or_create_config(config)?;
        let audit = Arc::new(FileAuditLog::new(home.audit_log_path()));

        Ok(Self {
            home,
            config,
            audit,
        })
    }

    pub fn codec(&self) -> FileCodec {
        FileCodec::new(&self.config, self.audit.clone())
    }

    /// Passphrase from the argument, then `SHIELD_PASSPHRASE`, then a prompt
    /// when `interactive` and stdin is a terminal. The result is length-checked.
    pub fn passphrase(&self, given: Option<String>, interactive: bool) -> Result<String> {
        let passphrase = match given.or_else(env_passphrase) {
            Some(passphrase) => passphrase,
            None if interactive && std::io::stdin().is_terminal() => {
                prompt_password("Enter passphrase: ")?
            }
            None => return Err(ShieldError::InvalidPassphrase("Passphrase required".into())),
        };

        self.config.validate_passphrase(&passphrase)?;
        Ok(passphrase)
    }
}

pub fn env_passphrase() -> Option<String> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|value| !value.is_empty())
}
