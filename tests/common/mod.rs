use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;
use tempfile::TempDir;

pub const PASSPHRASE: &str = "correct-horse-battery-staple12";

fn git(dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a new temporary git repository on branch `main` with user config set.
#[allow(dead_code)]
pub fn create_git_repo() -> TempDir {
    let temp = TempDir::new().expect("failed to create temp dir");

    git(temp.path(), &["init"]);
    git(temp.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(temp.path(), &["config", "user.email", "test@example.com"]);
    git(temp.path(), &["config", "user.name", "Test User"]);

    temp
}

/// Create a bare repository and register it as `origin` of `repo`.
#[allow(dead_code)]
pub fn add_bare_remote(repo: &Path) -> TempDir {
    let remote = TempDir::new().expect("failed to create temp dir");
    git(remote.path(), &["init", "--bare"]);

    let url = remote.path().to_str().expect("non-utf8 temp path");
    git(repo, &["remote", "add", "origin", url]);

    remote
}

/// Write `contents` to `root/relative`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    fs::write(path, contents).expect("failed to write file");
}

/// Run git in `dir` and return stdout.
#[allow(dead_code)]
pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// The artifact-shield binary with an isolated shield home and no
/// inherited `SHIELD_*` overrides.
#[allow(dead_code)]
pub fn shield_cmd(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("artifact-shield");
    cmd.env("ARTIFACT_SHIELD_HOME", home)
        .env_remove("SHIELD_PASSPHRASE")
        .env_remove("SHIELD_AUTO_ENCRYPT")
        .env_remove("SHIELD_DRY_RUN")
        .env_remove("RUST_LOG");
    cmd
}
