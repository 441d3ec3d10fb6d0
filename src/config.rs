//! # Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults ([`ShieldConfig::default`])
//! 2. JSON file, by default `~/.artifact_shield/config.json`
//! 3. environment variables prefixed with `SHIELD_`, e.g. `SHIELD_DRY_RUN=true`
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "min_key_length": 12,
//!   "max_key_length": 1000,
//!   "auto_encrypt": false,
//!   "delete_original_after_encrypt": false,
//!   "classifications": ["TOP_SECRET", "CONFIDENTIAL", "RESTRICTED"],
//!   "exclude_patterns": [".shield", "backups", "scripts/shield", "node_modules", ".git"],
//!   "encryption_marker": "ARTIFACT_SHIELD_ENCRYPTED",
//!   "dry_run": false
//! }
//! ```

use crate::crypto::DEFAULT_MARKER;
use crate::error::{Result, ShieldError};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SHIELD_DIR_NAME: &str = ".artifact_shield";
const CONFIG_FILE: &str = "config.json";
const AUDIT_LOG_FILE: &str = "audit.log";
const ENV_PREFIX: &str = "SHIELD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    pub version: String,
    pub min_key_length: usize,
    pub max_key_length: usize,
    pub auto_encrypt: bool,
    pub delete_original_after_encrypt: bool,
    pub classifications: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub encryption_marker: String,
    pub dry_run: bool,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            min_key_length: 12,
            max_key_length: 1000,
            auto_encrypt: false,
            delete_original_after_encrypt: false,
            classifications: vec![
                "TOP_SECRET".into(),
                "CONFIDENTIAL".into(),
                "RESTRICTED".into(),
            ],
            exclude_patterns: vec![
                ".shield".into(),
                "backups".into(),
                "scripts/shield".into(),
                "node_modules".into(),
                ".git".into(),
            ],
            encryption_marker: DEFAULT_MARKER.into(),
            dry_run: false,
        }
    }
}

impl ShieldConfig {
    /// Load configuration from an optional JSON file plus `SHIELD_*` overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            let path_str = path
                .to_str()
                .ok_or_else(|| ShieldError::Other("Invalid config path".into()))?;
            builder = builder.add_source(File::new(path_str, FileFormat::Json).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("classifications")
                .with_list_parse_key("exclude_patterns"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.encryption_marker.is_empty() {
            return Err(ShieldError::Other("encryption_marker must not be empty".into()));
        }
        if self.min_key_length > self.max_key_length {
            return Err(ShieldError::Other(format!(
                "min_key_length ({}) exceeds max_key_length ({})",
                self.min_key_length, self.max_key_length
            )));
        }
        Ok(())
    }

    /// Check passphrase length bounds (counted in characters)
    pub fn validate_passphrase(&self, passphrase: &str) -> Result<()> {
        let len = passphrase.chars().count();
        if len < self.min_key_length {
            return Err(ShieldError::InvalidPassphrase(format!(
                "too short (minimum {} characters)",
                self.min_key_length
            )));
        }
        if len > self.max_key_length {
            return Err(ShieldError::InvalidPassphrase(format!(
                "too long (maximum {} characters)",
                self.max_key_length
            )));
        }
        Ok(())
    }

    /// Whether the codec may remove plaintext after writing the artifact
    pub fn deletes_originals(&self) -> bool {
        self.delete_original_after_encrypt && !self.dry_run
    }
}

/// Locations of the per-user shield directory
#[derive(Debug, Clone)]
pub struct ShieldHome {
    dir: PathBuf,
}

impl ShieldHome {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `~/.artifact_shield`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ShieldError::Other("Could not determine home directory".into()))?;
        Ok(Self::new(home.join(SHIELD_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.dir.join(AUDIT_LOG_FILE)
    }

    /// Create the directory and a `.gitignore` that keeps its contents out of git
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let gitignore = self.dir.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, "*\n!.gitignore\n")?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.dir)?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&self.dir, perms)?;
        }

        Ok(())
    }

    /// Load the configuration, writing defaults on first use
    pub fn load_or_create_config(&self, explicit: Option<&Path>) -> Result<ShieldConfig> {
        if let Some(path) = explicit {
            return ShieldConfig::load(Some(path));
        }

        let path = self.config_path();
        if !path.exists() {
            if let Err(e) = ShieldConfig::default().save(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not write default config");
            }
        }
        ShieldConfig::load(Some(&path))
    }
}
