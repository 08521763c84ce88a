//! Test infrastructure for upbase integration tests.

#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use upbase::git::{no_op_logger, run_git};

pub const COMMITTER: &str = "test@example.com";

pub fn git(repo: &Path, args: &[&str]) -> Result<String> {
    run_git(repo, args, no_op_logger)
}

fn configure_identity(path: &Path) -> Result<()> {
    git(path, &["config", "user.email", COMMITTER])?;
    git(path, &["config", "user.name", "Test User"])?;
    Ok(())
}

/// A temporary git repository with a bare `origin` remote.
/// Both directories are removed when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    _remote_dir: TempDir,
    path: PathBuf,
    remote: PathBuf,
}

impl TestRepo {
    /// Creates a repository on `main` with one commit, pushed to `origin`.
    pub fn with_remote() -> Result<Self> {
        let remote_dir = TempDir::new()?;
        git(remote_dir.path(), &["init", "--bare", "-b", "main"])?;

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        git(&path, &["init", "-b", "main"])?;
        configure_identity(&path)?;

        std::fs::write(path.join("README.md"), "# Test Repo\n")?;
        git(&path, &["add", "README.md"])?;
        git(&path, &["commit", "-m", "Initial commit"])?;

        let remote = remote_dir.path().to_path_buf();
        git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;
        git(&path, &["push", "-u", "origin", "main"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            _remote_dir: remote_dir,
            path,
            remote,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_branch(&self) -> Result<String> {
        git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn head_of(&self, rev: &str) -> Result<String> {
        git(&self.path, &["rev-parse", rev])
    }

    /// Creates `name` at the current commit without checking it out.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        git(&self.path, &["branch", name])?;
        Ok(())
    }

    pub fn checkout(&self, name: &str) -> Result<()> {
        git(&self.path, &["checkout", name])?;
        Ok(())
    }

    /// Commits `content` to `file` on `branch`, then returns to the previous branch.
    pub fn commit_on(&self, branch: &str, file: &str, content: &str) -> Result<()> {
        let previous = self.current_branch()?;
        self.checkout(branch)?;
        std::fs::write(self.path.join(file), content)?;
        git(&self.path, &["add", file])?;
        git(&self.path, &["commit", "-m", &format!("Update {} on {}", file, branch)])?;
        self.checkout(&previous)
    }

    pub fn push(&self, branch: &str) -> Result<()> {
        git(&self.path, &["push", "origin", branch])?;
        Ok(())
    }

    /// Pushes a commit to `branch` of the remote from a separate clone,
    /// as another operator would.
    pub fn push_from_elsewhere(&self, branch: &str, file: &str, content: &str) -> Result<()> {
        let clone_dir = TempDir::new()?;
        let clone = clone_dir.path().join("clone");
        git(
            clone_dir.path(),
            &[
                "clone",
                "-b",
                branch,
                &self.remote.to_string_lossy(),
                &clone.to_string_lossy(),
            ],
        )?;
        configure_identity(&clone)?;
        std::fs::write(clone.join(file), content)?;
        git(&clone, &["add", file])?;
        git(&clone, &["commit", "-m", &format!("Remote update of {}", file)])?;
        git(&clone, &["push", "origin", branch])?;
        Ok(())
    }

    pub fn remote_head(&self, branch: &str) -> Result<Option<String>> {
        let output = git(&self.path, &["ls-remote", "--heads", "origin", branch])?;
        Ok(output
            .split_whitespace()
            .next()
            .map(str::to_string))
    }

    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        git(
            &self.path,
            &["merge-base", "--is-ancestor", ancestor, descendant],
        )
        .is_ok()
    }

    pub fn write_file(&self, file: &str, content: &str) -> Result<()> {
        std::fs::write(self.path.join(file), content)?;
        Ok(())
    }

    pub fn read_file(&self, file: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join(file))?)
    }

    pub fn file_exists(&self, file: &str) -> bool {
        self.path.join(file).exists()
    }

    /// Modifies a tracked file.
    pub fn make_dirty(&self) -> Result<()> {
        self.write_file("README.md", "# Test Repo\n\nwork in progress\n")
    }

    pub fn stash_messages(&self) -> Result<Vec<String>> {
        let output = git(&self.path, &["stash", "list", "--format=%s"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(!git(&self.path, &["status", "--porcelain", "--untracked-files=no"])?.is_empty())
    }

    pub fn rebase_in_progress(&self) -> Result<bool> {
        upbase::git::rebase_in_progress(&self.path, no_op_logger)
    }
}
