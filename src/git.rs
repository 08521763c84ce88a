//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution and error formatting.

use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::process::Output;

/// Callback invoked with the arguments of every git command before it runs.
pub type GitLogger = fn(&[&str]);

/// Echoes the git command line to stderr.
pub fn verbose_logger(args: &[&str]) {
    eprintln!("    {}", format!("$ git {}", args.join(" ")).dimmed());
}

pub fn no_op_logger(_args: &[&str]) {}

fn git_output(repo: &Path, args: &[&str], logger: GitLogger) -> anyhow::Result<Output> {
    logger(args);
    std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .context("Failed to execute git command")
}

pub fn run_git(repo: &Path, args: &[&str], logger: GitLogger) -> anyhow::Result<String> {
    let output = git_output(repo, args, logger)?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

fn validate_ref_name(name: &str) -> anyhow::Result<()> {
    if name.contains('\0') || name.contains('\n') || name.is_empty() || name.starts_with('-') {
        anyhow::bail!("Invalid ref name: {:?}", name);
    }
    Ok(())
}

pub fn get_current_branch(repo: &Path, logger: GitLogger) -> anyhow::Result<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"], logger)
        .context("Failed to get current branch")
}

pub fn get_current_commit(repo: &Path, logger: GitLogger) -> anyhow::Result<String> {
    run_git(repo, &["rev-parse", "HEAD"], logger).context("Failed to get current commit")
}

/// Reads a git config value. An unset key is `Ok(None)`, not an error.
pub fn config_get(repo: &Path, key: &str, logger: GitLogger) -> anyhow::Result<Option<String>> {
    let output = git_output(repo, &["config", "--get", key], logger)?;

    // `git config --get` exits with 1 when the key is missing.
    match output.status.code() {
        Some(0) => {
            let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok((!value.is_empty()).then_some(value))
        }
        Some(1) => Ok(None),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git config --get {} failed: {}", key, stderr.trim())
        }
    }
}

pub fn fetch(repo: &Path, remote: &str, logger: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    run_git(repo, &["fetch", remote], logger)
        .with_context(|| format!("Failed to fetch from remote '{}'", remote))?;
    Ok(())
}

/// Switches to the existing local branch `branch`.
///
/// `git switch` never reads its argument as a path, and `--no-guess` stops
/// git from creating the branch out of a same-named remote-tracking ref.
pub fn checkout(repo: &Path, branch: &str, logger: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(branch)?;
    run_git(repo, &["switch", "--no-guess", branch], logger)
        .with_context(|| format!("Failed to checkout '{}'", branch))?;
    Ok(())
}

/// Detaches HEAD at `commit`.
pub fn checkout_detached(repo: &Path, commit: &str, logger: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(commit)?;
    run_git(repo, &["switch", "--detach", commit], logger)
        .with_context(|| format!("Failed to checkout commit '{}'", commit))?;
    Ok(())
}

pub fn rebase(repo: &Path, upstream: &str, logger: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(upstream)?;
    run_git(repo, &["rebase", upstream], logger)
        .with_context(|| format!("Failed to rebase onto '{}'", upstream))?;
    Ok(())
}

pub fn rebase_in_progress(repo: &Path, logger: GitLogger) -> anyhow::Result<bool> {
    for state_dir in ["rebase-merge", "rebase-apply"] {
        let path = run_git(repo, &["rev-parse", "--git-path", state_dir], logger)
            .context("Failed to locate rebase state")?;
        if repo.join(path).exists() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Aborts the rebase in progress. A rebase that never started (e.g. an
/// unknown upstream) leaves nothing to abort and succeeds.
pub fn rebase_abort(repo: &Path, logger: GitLogger) -> anyhow::Result<()> {
    if !rebase_in_progress(repo, logger)? {
        return Ok(());
    }
    run_git(repo, &["rebase", "--abort"], logger).context("Failed to abort rebase")?;
    Ok(())
}

pub fn push(
    repo: &Path,
    remote: &str,
    branch: &str,
    force: bool,
    logger: GitLogger,
) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    let mut args = vec!["push", remote, branch];
    if force {
        args.push("--force");
    }
    run_git(repo, &args, logger)
        .with_context(|| format!("Failed to push '{}' to '{}'", branch, remote))?;
    Ok(())
}

/// Stashes local changes under `message`. Returns `false` when there was nothing to stash.
pub fn stash_push(repo: &Path, message: &str, logger: GitLogger) -> anyhow::Result<bool> {
    let output = run_git(repo, &["stash", "push", "-m", message], logger)
        .context("Failed to stash changes")?;
    Ok(!output.contains("No local changes to save"))
}

/// Finds the stash entry whose message contains `label`, returning its `stash@{n}` ref.
pub fn find_stash(repo: &Path, label: &str, logger: GitLogger) -> anyhow::Result<Option<String>> {
    let listing = run_git(repo, &["stash", "list", "--format=%gd%x09%s"], logger)
        .context("Failed to list stash entries")?;
    Ok(parse_stash_list(&listing, label))
}

pub fn stash_apply(repo: &Path, stash_ref: &str, logger: GitLogger) -> anyhow::Result<()> {
    run_git(repo, &["stash", "apply", stash_ref], logger)
        .with_context(|| format!("Failed to apply stash '{}'", stash_ref))?;
    Ok(())
}

fn parse_stash_list(listing: &str, label: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let (stash_ref, subject) = line.split_once('\t')?;
        subject.contains(label).then(|| stash_ref.to_string())
    })
}
