use crate::error::{Result, ShieldError};
use git2::{
    Cred, CredentialType, Delta, DiffOptions, PushOptions, RemoteCallbacks, Repository,
    ResetType,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Version control operations used by the batch coordinator and the
/// pre-commit check. Paths are relative to the working directory.
pub trait VersionControl {
    /// Add the file's current content to the index
    fn stage(&self, path: &Path) -> Result<()>;

    /// Reset the index entry for `path` to HEAD
    fn unstage(&self, path: &Path) -> Result<()>;

    /// Drop `path` from the index and delete it from the working tree
    fn remove(&self, path: &Path) -> Result<()>;

    /// Reset the whole index to HEAD, keeping the working tree
    fn reset(&self) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Files added or modified in the index relative to HEAD
    fn staged_files(&self) -> Result<Vec<PathBuf>>;
}

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open repository at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| ShieldError::NotInGitRepo)?;
        Ok(Self { repo })
    }

    /// Get repository root path
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or(ShieldError::Other(
            "Repository has no working directory".into(),
        ))
    }

    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo.head().ok()?.peel_to_commit().ok()
    }
}

impl VersionControl for GitRepo {
    fn stage(&self, path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(path)?;
        index.write()?;
        Ok(())
    }

    fn unstage(&self, path: &Path) -> Result<()> {
        match self.head_commit() {
            Some(head) => self.repo.reset_default(Some(head.as_object()), [path])?,
            None => {
                let mut index = self.repo.index()?;
                index.remove_path(path)?;
                index.write()?;
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;
        index.remove_path(path)?;
        index.write()?;

        let full = self.workdir()?.join(path);
        if full.exists() {
            fs::remove_file(full)?;
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        match self.head_commit() {
            Some(head) => self.repo.reset(head.as_object(), ResetType::Mixed, None)?,
            None => {
                let mut index = self.repo.index()?;
                index.clear()?;
                index.write()?;
            }
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let commit = || -> std::result::Result<git2::Oid, git2::Error> {
            let mut index = self.repo.index()?;
            let tree_id = index.write_tree()?;
            let tree = self.repo.find_tree(tree_id)?;
            let signature = self.repo.signature()?;

            let parent = self.head_commit();
            let parents: Vec<&git2::Commit> = parent.iter().collect();

            self.repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        };

        let oid = commit().map_err(|e| ShieldError::Commit(e.message().to_string()))?;
        tracing::info!(commit = %oid, "committed");
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let push_error = |e: git2::Error| ShieldError::Push(e.message().to_string());

        let mut remote_handle = self.repo.find_remote(remote).map_err(push_error)?;
        let config = self.repo.config().map_err(push_error)?;
        let rejected: RefCell<Option<String>> = RefCell::new(None);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                if let Some(user) = username {
                    return Cred::ssh_key_from_agent(user);
                }
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::credential_helper(&config, url, username);
            }
            Cred::default()
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                *rejected.borrow_mut() = Some(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote_handle
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(push_error)?;

        if let Some(reason) = rejected.take() {
            return Err(ShieldError::Push(format!("rejected by {remote}: {reason}")));
        }

        tracing::info!(remote, branch, "pushed");
        Ok(())
    }

    fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let head_tree = match self.head_commit() {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };
        let index = self.repo.index()?;

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut opts))?;

        let files = diff
            .deltas()
            .filter(|delta| {
                matches!(
                    delta.status(),
                    Delta::Added | Delta::Modified | Delta::Copied
                )
            })
            .filter_map(|delta| delta.new_file().path().map(Path::to_path_buf))
            .collect();

        Ok(files)
    }
}
