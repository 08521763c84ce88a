// Per-branch update: checkout, rebase, optional push, post-script

use crate::auth;
use crate::manifest::{BranchSpec, PushConfig};
use crate::run::RunContext;
use crate::script::ScriptRunner;
use crate::vcs::Vcs;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Severity of a message sent to [`UpdateCallbacks::on_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    /// A condition that stops the whole run.
    Exception,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStep {
    Stashing { label: String },
    Fetching { remote: String },
    CheckingOut { branch: String },
    Rebasing { branch: String, upstream: String },
    AbortingRebase { branch: String },
    Pushing { branch: String, remote: String, force: bool },
    RunningPostScript { branch: String },
    RestoringHead { target: String },
    ApplyingStash { label: String },
    Completed,
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStep::Stashing { label } => write!(f, "Stashing local changes as '{}'", label),
            UpdateStep::Fetching { remote } => write!(f, "Fetching '{}'", remote),
            UpdateStep::CheckingOut { branch } => write!(f, "Checking out '{}'", branch),
            UpdateStep::Rebasing { branch, upstream } => {
                write!(f, "Rebasing '{}' on top of '{}'", branch, upstream)
            }
            UpdateStep::AbortingRebase { branch } => write!(f, "Aborting rebase of '{}'", branch),
            UpdateStep::Pushing {
                branch,
                remote,
                force,
            } => {
                let mode = if *force { " (force)" } else { "" };
                write!(f, "Pushing '{}' to '{}'{}", branch, remote, mode)
            }
            UpdateStep::RunningPostScript { branch } => {
                write!(f, "Running post-script for '{}'", branch)
            }
            UpdateStep::RestoringHead { target } => write!(f, "Restoring '{}'", target),
            UpdateStep::ApplyingStash { label } => write!(f, "Applying stash '{}'", label),
            UpdateStep::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScriptStatus {
    NotConfigured,
    Succeeded,
    Failed,
}

/// What happened to one branch. Every variant lets the run continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Skipped,
    CheckoutFailed,
    RebaseAborted,
    PushDenied,
    /// The rebase onto the remote copy of the local branch conflicted and was aborted.
    PushRebaseAborted,
    PushFailed,
    /// The branch was rebased. A failed post-script does not change this.
    Success {
        pushed: bool,
        post_script: PostScriptStatus,
    },
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success { .. })
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Skipped => write!(f, "skipped (disabled)"),
            UpdateOutcome::CheckoutFailed => write!(f, "not found locally"),
            UpdateOutcome::RebaseAborted => write!(f, "rebase conflict, aborted"),
            UpdateOutcome::PushDenied => write!(f, "rebased, push denied"),
            UpdateOutcome::PushRebaseAborted => {
                write!(f, "rebased, conflict with remote copy, aborted")
            }
            UpdateOutcome::PushFailed => write!(f, "rebased, push failed"),
            UpdateOutcome::Success {
                pushed,
                post_script,
            } => {
                write!(f, "updated")?;
                if *pushed {
                    write!(f, ", pushed")?;
                }
                match post_script {
                    PostScriptStatus::NotConfigured => Ok(()),
                    PostScriptStatus::Succeeded => write!(f, ", post-script ok"),
                    PostScriptStatus::Failed => write!(f, ", post-script failed"),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct BranchResult {
    pub local_branch: String,
    pub outcome: UpdateOutcome,
    pub duration: Duration,
}

/// A rebase could not be aborted; the repository is stuck mid-rebase.
#[derive(Debug, Error)]
#[error("failed aborting rebase of '{branch}' on top of '{upstream}': {source:#}")]
pub struct AbortFailed {
    pub branch: String,
    pub upstream: String,
    #[source]
    pub source: anyhow::Error,
}

/// Receives progress and leveled messages during a run.
pub trait UpdateCallbacks {
    fn on_step(&self, step: &UpdateStep);
    fn on_message(&self, _level: Level, _message: &str) {}
    fn on_complete(&self, result: &BranchResult);
}

/// Updates one branch.
///
/// Precondition: the working tree is clean. Postcondition: `spec.local_branch`
/// is checked out unless the outcome is `Skipped` or `CheckoutFailed`.
///
/// Only an abort that itself fails is returned as an error; every other
/// failure becomes an [`UpdateOutcome`].
pub fn update(
    spec: &BranchSpec,
    ctx: &RunContext,
    vcs: &impl Vcs,
    scripts: &impl ScriptRunner,
    callbacks: &impl UpdateCallbacks,
) -> Result<UpdateOutcome, AbortFailed> {
    let branch = spec.local_branch.as_str();
    if spec.disabled {
        callbacks.on_message(Level::Info, &format!("Skipping disabled branch '{}'", branch));
        return Ok(UpdateOutcome::Skipped);
    }

    callbacks.on_step(&UpdateStep::CheckingOut {
        branch: branch.to_string(),
    });
    if let Err(e) = vcs.checkout(branch) {
        callbacks.on_message(
            Level::Error,
            &format!("Branch '{}' does not exist locally: {:#}", branch, e),
        );
        return Ok(UpdateOutcome::CheckoutFailed);
    }

    let upstream = format!("{}/{}", ctx.remote, spec.remote_branch);
    if !rebase_or_abort(branch, &upstream, vcs, callbacks)? {
        return Ok(UpdateOutcome::RebaseAborted);
    }

    let pushed = match &spec.push_to_remote {
        None => false,
        Some(push) => match push_branch(branch, push, ctx, vcs, callbacks)? {
            Ok(()) => true,
            Err(outcome) => return Ok(outcome),
        },
    };

    let post_script = run_post_script(spec, scripts, callbacks);

    Ok(UpdateOutcome::Success {
        pushed,
        post_script,
    })
}

/// Times [`update`] and packages the outcome for callbacks and summaries.
pub fn update_timed(
    spec: &BranchSpec,
    ctx: &RunContext,
    vcs: &impl Vcs,
    scripts: &impl ScriptRunner,
    callbacks: &impl UpdateCallbacks,
) -> Result<BranchResult, AbortFailed> {
    let start = Instant::now();
    let outcome = update(spec, ctx, vcs, scripts, callbacks)?;
    Ok(BranchResult {
        local_branch: spec.local_branch.clone(),
        outcome,
        duration: start.elapsed(),
    })
}

/// Rebases the current branch onto `upstream`. On failure the rebase is
/// aborted and `Ok(false)` returned; a failing abort is fatal.
fn rebase_or_abort(
    branch: &str,
    upstream: &str,
    vcs: &impl Vcs,
    callbacks: &impl UpdateCallbacks,
) -> Result<bool, AbortFailed> {
    callbacks.on_step(&UpdateStep::Rebasing {
        branch: branch.to_string(),
        upstream: upstream.to_string(),
    });
    let Err(e) = vcs.rebase(upstream) else {
        return Ok(true);
    };

    callbacks.on_message(
        Level::Warning,
        &format!(
            "Conflicts while rebasing '{}' on top of '{}', aborting rebase: {:#}",
            branch, upstream, e
        ),
    );
    callbacks.on_step(&UpdateStep::AbortingRebase {
        branch: branch.to_string(),
    });
    vcs.rebase_abort().map_err(|source| AbortFailed {
        branch: branch.to_string(),
        upstream: upstream.to_string(),
        source,
    })?;
    Ok(false)
}

/// Authorizes, folds in the remote copy of `branch`, then pushes it.
/// The inner `Err` carries the outcome that ends this branch early.
fn push_branch(
    branch: &str,
    push: &PushConfig,
    ctx: &RunContext,
    vcs: &impl Vcs,
    callbacks: &impl UpdateCallbacks,
) -> Result<Result<(), UpdateOutcome>, AbortFailed> {
    if !auth::authorize(
        branch,
        push,
        ctx.committer_identity.as_deref(),
        callbacks,
    ) {
        return Ok(Err(UpdateOutcome::PushDenied));
    }

    // The remote may have moved since the run started.
    callbacks.on_step(&UpdateStep::Fetching {
        remote: ctx.remote.clone(),
    });
    if let Err(e) = vcs.fetch(&ctx.remote) {
        callbacks.on_message(
            Level::Error,
            &format!("Not pushing '{}': {:#}", branch, e),
        );
        return Ok(Err(UpdateOutcome::PushFailed));
    }

    let own_upstream = format!("{}/{}", ctx.remote, branch);
    if !rebase_or_abort(branch, &own_upstream, vcs, callbacks)? {
        return Ok(Err(UpdateOutcome::PushRebaseAborted));
    }

    callbacks.on_step(&UpdateStep::Pushing {
        branch: branch.to_string(),
        remote: ctx.remote.clone(),
        force: push.force,
    });
    if let Err(e) = vcs.push(&ctx.remote, branch, push.force) {
        callbacks.on_message(
            Level::Error,
            &format!("Failed pushing '{}' to '{}': {:#}", branch, ctx.remote, e),
        );
        return Ok(Err(UpdateOutcome::PushFailed));
    }
    Ok(Ok(()))
}

fn run_post_script(
    spec: &BranchSpec,
    scripts: &impl ScriptRunner,
    callbacks: &impl UpdateCallbacks,
) -> PostScriptStatus {
    if spec.post_script.is_empty() {
        return PostScriptStatus::NotConfigured;
    }

    callbacks.on_step(&UpdateStep::RunningPostScript {
        branch: spec.local_branch.clone(),
    });
    match scripts.run(&spec.post_script) {
        Ok(()) => PostScriptStatus::Succeeded,
        Err(failure) => {
            callbacks.on_message(
                Level::Error,
                &format!("Post-script for '{}' failed: {}", spec.local_branch, failure),
            );
            PostScriptStatus::Failed
        }
    }
}
