//! Version-control boundary used by the orchestrator and run coordinator.
//!
//! [`Vcs`] lists exactly the operations a run needs. [`GitRepo`] forwards them
//! to the git CLI wrappers; tests substitute a scripted implementation.

use crate::git::{self, GitLogger};
use std::path::{Path, PathBuf};

pub trait Vcs {
    /// Name of the checked-out branch, or `HEAD` when detached.
    fn current_branch(&self) -> anyhow::Result<String>;
    fn current_commit(&self) -> anyhow::Result<String>;
    fn config_get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn fetch(&self, remote: &str) -> anyhow::Result<()>;
    /// Switches to an existing local branch. Paths, tags and remote-only
    /// branches are rejected.
    fn checkout(&self, branch: &str) -> anyhow::Result<()>;
    fn checkout_detached(&self, commit: &str) -> anyhow::Result<()>;
    fn rebase(&self, upstream: &str) -> anyhow::Result<()>;
    fn rebase_abort(&self) -> anyhow::Result<()>;
    fn push(&self, remote: &str, branch: &str, force: bool) -> anyhow::Result<()>;
    /// Returns `false` when the working tree had nothing to stash.
    fn stash_push(&self, label: &str) -> anyhow::Result<bool>;
    /// Applies, without dropping, the stash entry whose message contains `label`.
    fn stash_apply(&self, label: &str) -> anyhow::Result<()>;
}

/// [`Vcs`] backed by the `git` binary, operating on one repository path.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
    logger: GitLogger,
}

impl GitRepo {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, logger: GitLogger) -> Self {
        Self {
            path: path.into(),
            logger,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Vcs for GitRepo {
    fn current_branch(&self) -> anyhow::Result<String> {
        git::get_current_branch(&self.path, self.logger)
    }

    fn current_commit(&self) -> anyhow::Result<String> {
        git::get_current_commit(&self.path, self.logger)
    }

    fn config_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        git::config_get(&self.path, key, self.logger)
    }

    fn fetch(&self, remote: &str) -> anyhow::Result<()> {
        git::fetch(&self.path, remote, self.logger)
    }

    fn checkout(&self, branch: &str) -> anyhow::Result<()> {
        git::checkout(&self.path, branch, self.logger)
    }

    fn checkout_detached(&self, commit: &str) -> anyhow::Result<()> {
        git::checkout_detached(&self.path, commit, self.logger)
    }

    fn rebase(&self, upstream: &str) -> anyhow::Result<()> {
        git::rebase(&self.path, upstream, self.logger)
    }

    fn rebase_abort(&self) -> anyhow::Result<()> {
        git::rebase_abort(&self.path, self.logger)
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> anyhow::Result<()> {
        git::push(&self.path, remote, branch, force, self.logger)
    }

    fn stash_push(&self, label: &str) -> anyhow::Result<bool> {
        git::stash_push(&self.path, label, self.logger)
    }

    fn stash_apply(&self, label: &str) -> anyhow::Result<()> {
        let stash_ref = git::find_stash(&self.path, label, self.logger)?
            .ok_or_else(|| anyhow::anyhow!("No stash entry labelled '{}'", label))?;
        git::stash_apply(&self.path, &stash_ref, self.logger)
    }
}
