mod commands;

use artifact_shield::batch::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use artifact_shield::manifest::DEFAULT_MANIFEST;
use artifact_shield::Result;
use clap::{Parser, Subcommand};
use commands::Context;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "artifact-shield")]
#[command(version)]
#[command(about = "Passphrase encryption for sensitive files in a git repository", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.artifact_shield/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Shield directory holding configuration and the audit log
    #[arg(long, global = true, env = "ARTIFACT_SHIELD_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into FILE.enc
    Encrypt {
        file: PathBuf,
    },

    /// Decrypt FILE.enc back into FILE
    Decrypt {
        file: PathBuf,
    },

    /// Encrypt, decrypt and compare a file to check the round trip
    Validate {
        file: PathBuf,
    },

    /// Encrypt every file under the given directories
    Scan {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Only encrypt files whose leading text contains this label
        #[arg(short, long)]
        classification: Option<String>,

        /// Remove plaintext after encrypting
        #[arg(long)]
        delete: bool,
    },

    /// Show which files under a directory are encrypted
    Status {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Encrypt, commit, push and verify all sensitive manifest entries
    Batch {
        /// Passphrase (falls back to SHIELD_PASSPHRASE)
        passphrase: Option<String>,

        /// Manifest file, relative paths resolved against the repository root
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        #[arg(long, default_value = DEFAULT_REMOTE)]
        remote: String,

        #[arg(long, default_value = DEFAULT_BRANCH)]
        branch: String,
    },

    /// Check committed artifacts against a backup archive
    Verify {
        #[arg(long)]
        backup: PathBuf,

        /// Passphrase (falls back to SHIELD_PASSPHRASE)
        passphrase: Option<String>,

        /// Manifest file, relative paths resolved against the repository root
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Pre-commit check for staged files carrying a classification
    Check,

    /// Show the current configuration
    Config,

    /// Show recent audit log entries
    Audit {
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("artifact_shield=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::load(cli.home.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Encrypt { file } => commands::encrypt(&ctx, &file),
        Commands::Decrypt { file } => commands::decrypt(&ctx, &file),
        Commands::Validate { file } => commands::validate(&ctx, &file),
        Commands::Scan {
            dirs,
            classification,
            delete,
        } => commands::scan(&ctx, &dirs, classification.as_deref(), delete),
        Commands::Status { dir } => commands::status(&ctx, &dir),
        Commands::Batch {
            passphrase,
            manifest,
            remote,
            branch,
        } => commands::batch(&ctx, passphrase, &manifest, remote, branch),
        Commands::Verify {
            backup,
            passphrase,
            manifest,
        } => commands::verify(&ctx, &backup, passphrase, &manifest),
        Commands::Check => commands::check(&ctx),
        Commands::Config => commands::show_config(&ctx),
        Commands::Audit { count } => commands::show_audit(&ctx, count),
    }
}
