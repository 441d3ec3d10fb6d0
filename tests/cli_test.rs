//! # CLI Tests
//!
//! Exercises the binary's single-file, scan, status, pre-commit and
//! informational commands. Every test gets its own shield home so nothing
//! touches `~/.artifact_shield`.
//!
//! ```bash
//! cargo test --test cli_test
//! ```

mod common;

use artifact_shield::crypto::CipherEngine;
use common::{create_git_repo, git_output, shield_cmd, write_file, PASSPHRASE};
use predicates::prelude::*;
use std::fs;
use std::process::Command as StdCommand;
use tempfile::TempDir;

struct Env {
    home: TempDir,
    work: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = shield_cmd(self.home.path());
        cmd.current_dir(self.work.path())
            .env("SHIELD_PASSPHRASE", PASSPHRASE);
        cmd
    }
}

#[test]
fn test_help_lists_commands() {
    let env = Env::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypt"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_encrypt_then_decrypt() {
    let env = Env::new();
    write_file(env.work.path(), "notes.txt", "hello world");

    env.cmd()
        .args(["encrypt", "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted: notes.txt -> notes.txt.enc"));

    let package = fs::read(env.work.path().join("notes.txt.enc")).unwrap();
    assert!(package.starts_with(b"ARTIFACT_SHIELD_ENCRYPTED::v1.0::"));
    // Originals are kept unless configured otherwise
    assert!(env.work.path().join("notes.txt").exists());

    fs::remove_file(env.work.path().join("notes.txt")).unwrap();
    env.cmd()
        .args(["decrypt", "notes.txt.enc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Decrypted:"));

    assert_eq!(
        fs::read_to_string(env.work.path().join("notes.txt")).unwrap(),
        "hello world"
    );
    assert!(!env.work.path().join("notes.txt.enc").exists());
}

#[test]
fn test_encrypt_artifact_is_noop() {
    let env = Env::new();
    let package = CipherEngine::default().encrypt(b"data", PASSPHRASE);
    fs::write(env.work.path().join("data.txt.enc"), package).unwrap();

    env.cmd()
        .args(["encrypt", "data.txt.enc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already encrypted"));

    assert!(!env.work.path().join("data.txt.enc.enc").exists());
}

#[test]
fn test_encrypt_missing_file_fails() {
    let env = Env::new();
    env.cmd()
        .args(["encrypt", "absent.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing file"));
}

#[test]
fn test_encrypt_without_passphrase_fails() {
    let env = Env::new();
    write_file(env.work.path(), "notes.txt", "hello");

    shield_cmd(env.home.path())
        .current_dir(env.work.path())
        .args(["encrypt", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passphrase required"));
    assert!(!env.work.path().join("notes.txt.enc").exists());
}

#[test]
fn test_short_passphrase_rejected() {
    let env = Env::new();
    write_file(env.work.path(), "notes.txt", "hello");

    env.cmd()
        .env("SHIELD_PASSPHRASE", "short")
        .args(["encrypt", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too short"));
}

#[test]
fn test_decrypt_foreign_marker_fails() {
    let env = Env::new();
    let package = CipherEngine::new("SOMEONE_ELSE").encrypt(b"data", PASSPHRASE);
    fs::write(env.work.path().join("data.txt.enc"), package).unwrap();

    env.cmd()
        .args(["decrypt", "data.txt.enc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));

    assert!(env.work.path().join("data.txt.enc").exists());
    assert!(!env.work.path().join("data.txt").exists());
}

#[test]
fn test_decrypt_requires_enc_suffix() {
    let env = Env::new();
    write_file(env.work.path(), "plain.txt", "data");

    env.cmd()
        .args(["decrypt", "plain.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not an encrypted file"));
}

#[test]
fn test_validate_round_trip() {
    let env = Env::new();
    write_file(env.work.path(), "report.txt", "CONFIDENTIAL\nquarterly numbers");

    env.cmd()
        .args(["validate", "report.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Round trip OK"));

    // Scratch work leaves nothing behind
    assert!(!env.work.path().join("report.txt.enc").exists());
    assert_eq!(
        fs::read_to_string(env.work.path().join("report.txt")).unwrap(),
        "CONFIDENTIAL\nquarterly numbers"
    );
}

#[test]
fn test_scan_by_classification() {
    let env = Env::new();
    write_file(env.work.path(), "docs/plan.txt", "TOP_SECRET\nplan");
    write_file(env.work.path(), "docs/memo.txt", "CONFIDENTIAL\nmemo");
    write_file(env.work.path(), "docs/public.txt", "hello");

    env.cmd()
        .args(["scan", "docs", "--classification", "TOP_SECRET"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted: 1 files"));

    assert!(env.work.path().join("docs/plan.txt.enc").exists());
    assert!(!env.work.path().join("docs/memo.txt.enc").exists());
    assert!(!env.work.path().join("docs/public.txt.enc").exists());
}

#[test]
fn test_scan_multiple_dirs_with_delete() {
    let env = Env::new();
    write_file(env.work.path(), "one/a.txt", "a");
    write_file(env.work.path(), "two/b.txt", "b");

    env.cmd()
        .args(["scan", "one", "two", "--delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2 encrypted, 0 skipped"));

    assert!(!env.work.path().join("one/a.txt").exists());
    assert!(!env.work.path().join("two/b.txt").exists());
    assert!(env.work.path().join("one/a.txt.enc").exists());
    assert!(env.work.path().join("two/b.txt.enc").exists());
}

#[test]
fn test_scan_delete_respects_dry_run() {
    let env = Env::new();
    write_file(env.work.path(), "one/a.txt", "a");

    env.cmd()
        .env("SHIELD_DRY_RUN", "true")
        .args(["scan", "one", "--delete"])
        .assert()
        .success();

    assert!(env.work.path().join("one/a.txt").exists());
    assert!(env.work.path().join("one/a.txt.enc").exists());
}

#[test]
fn test_scan_missing_directory_fails() {
    let env = Env::new();
    env.cmd()
        .args(["scan", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_status_reports_plaintext() {
    let env = Env::new();
    write_file(env.work.path(), "tree/a.txt", "a");
    write_file(env.work.path(), "tree/b.txt", "b");
    write_file(env.work.path(), "tree/node_modules/dep.js", "ignored");

    env.cmd()
        .args(["encrypt", "tree/a.txt"])
        .assert()
        .success();

    env.cmd()
        .args(["status", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted: 1 files"))
        .stdout(predicate::str::contains("Plaintext: 2 files"))
        .stdout(predicate::str::contains("b.txt"))
        .stdout(predicate::str::contains("dep.js").not());
}

#[test]
fn test_config_shows_defaults_and_creates_home() {
    let env = Env::new();

    env.cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"encryption_marker\": \"ARTIFACT_SHIELD_ENCRYPTED\""))
        .stdout(predicate::str::contains("\"min_key_length\": 12"));

    assert!(env.home.path().join("config.json").exists());
    assert_eq!(
        fs::read_to_string(env.home.path().join(".gitignore")).unwrap(),
        "*\n!.gitignore\n"
    );
}

#[test]
fn test_config_file_override() {
    let env = Env::new();
    let config = env.work.path().join("custom.json");
    fs::write(&config, r#"{ "min_key_length": 40 }"#).unwrap();
    write_file(env.work.path(), "notes.txt", "hello");

    env.cmd()
        .arg("--config")
        .arg(&config)
        .args(["encrypt", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimum 40 characters"));
}

#[test]
fn test_audit_shows_recent_entries() {
    let env = Env::new();
    write_file(env.work.path(), "notes.txt", "hello");

    env.cmd()
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit log entries"));

    env.cmd()
        .args(["encrypt", "notes.txt"])
        .assert()
        .success();

    env.cmd()
        .args(["audit", "-n", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted:"))
        .stdout(predicate::str::contains(" | "));
}

#[test]
fn test_batch_requires_passphrase() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();

    shield_cmd(home.path())
        .arg("batch")
        .current_dir(repo.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Passphrase required"));
}

#[test]
fn test_batch_missing_manifest_fails() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();

    shield_cmd(home.path())
        .args(["batch", PASSPHRASE, "--manifest", "absent.json"])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid manifest"));
}

#[test]
fn test_batch_without_backup_exits_with_code_1() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();
    write_file(repo.path(), "secrets/a.txt", "alpha secret");
    write_file(
        repo.path(),
        "csv-manifest.json",
        r#"[{ "path": "secrets/a.txt", "sensitive": true }]"#,
    );
    // A plain file where the backups directory belongs: no snapshot can be
    // written and none can be listed
    write_file(repo.path(), "backups", "not a directory");

    shield_cmd(home.path())
        .args(["batch", PASSPHRASE])
        .current_dir(repo.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Final state: Init"))
        .stderr(predicate::str::contains("No backup snapshot available"));

    assert_eq!(
        fs::read_to_string(repo.path().join("secrets/a.txt")).unwrap(),
        "alpha secret"
    );
    assert!(!repo.path().join("secrets/a.txt.enc").exists());
}

#[test]
fn test_check_reports_unencrypted_sensitive_files() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();
    write_file(repo.path(), "memo.txt", "CONFIDENTIAL\nmerger plans");
    write_file(repo.path(), "readme.md", "hello");
    StdCommand::new("git")
        .args(["add", "."])
        .current_dir(repo.path())
        .status()
        .unwrap();

    shield_cmd(home.path())
        .arg("check")
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("memo.txt (CONFIDENTIAL)"))
        .stdout(predicate::str::contains("readme.md").not());

    assert!(!repo.path().join("memo.txt.enc").exists());
}

#[test]
fn test_check_auto_encrypts_when_enabled() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();
    write_file(repo.path(), "memo.txt", "TOP_SECRET\nlaunch codes");
    StdCommand::new("git")
        .args(["add", "memo.txt"])
        .current_dir(repo.path())
        .status()
        .unwrap();

    shield_cmd(home.path())
        .arg("check")
        .env("SHIELD_AUTO_ENCRYPT", "1")
        .env("SHIELD_PASSPHRASE", PASSPHRASE)
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted and staged: memo.txt.enc"));

    let staged = git_output(repo.path(), &["diff", "--cached", "--name-only"]);
    assert!(staged.lines().any(|line| line == "memo.txt.enc"));
    assert!(!staged.lines().any(|line| line == "memo.txt"));
}

#[test]
fn test_check_without_passphrase_never_blocks() {
    let repo = create_git_repo();
    let home = TempDir::new().unwrap();
    write_file(repo.path(), "memo.txt", "RESTRICTED\nnotes");
    StdCommand::new("git")
        .args(["add", "memo.txt"])
        .current_dir(repo.path())
        .status()
        .unwrap();

    shield_cmd(home.path())
        .arg("check")
        .env("SHIELD_AUTO_ENCRYPT", "1")
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SHIELD_PASSPHRASE is not set"));
}

#[test]
fn test_check_outside_repository_fails() {
    let env = Env::new();
    env.cmd()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a git repository"));
}
