//! Whole-run coordination.
//!
//! A run stashes local changes under a unique label, fetches once, updates
//! every configured branch in order and finally returns to the original
//! checkout and applies the stash. If a rebase cannot be aborted the run
//! stops where it is and leaves the stash untouched, printing how to recover.

use crate::constants::{COMMITTER_IDENTITY_KEY, DETACHED_HEAD, STASH_PREFIX};
use crate::manifest::BranchSpec;
use crate::script::ScriptRunner;
use crate::update::{self, BranchResult, Level, UpdateCallbacks, UpdateStep};
use crate::vcs::Vcs;
use chrono::{DateTime, Local};
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// Where the working tree was before the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginalHead {
    Branch(String),
    DetachedAt(String),
}

impl OriginalHead {
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(self, OriginalHead::DetachedAt(_))
    }

    pub fn display(&self) -> String {
        match self {
            OriginalHead::Branch(name) => name.clone(),
            OriginalHead::DetachedAt(sha) => format!("detached at {}", short_sha(sha)),
        }
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

/// State shared by every branch update of one run. Read-only once built.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub remote: String,
    pub original_head: OriginalHead,
    pub stash_label: String,
    /// `user.email` of the local repository, if configured.
    pub committer_identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Nothing was touched: the original head or the stash could not be captured.
    StartFailed { error: String },
    /// A fatal error stopped the run; the stash, if any, is still in place.
    Aborted { error: String },
    /// Every branch was processed but the original head or stash could not be restored.
    RestoreFailed { error: String },
}

#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<BranchResult>,
    pub status: RunStatus,
    pub original_head: Option<OriginalHead>,
    /// Label of the stash entry created by this run, if anything was stashed.
    pub stash: Option<String>,
    pub duration: Duration,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    /// The message telling the user where their work is.
    pub fn recovery_hint(&self) -> Option<String> {
        let head = self.original_head.as_ref()?.display();
        Some(match &self.stash {
            Some(label) => format!(
                "Stashed your changes in original branch '{}' under name '{}'",
                head, label
            ),
            None => format!("No changes were stashed; original branch was '{}'", head),
        })
    }
}

/// Builds the stash label: unique per run and searchable later.
#[must_use]
pub fn stash_label(head: &OriginalHead, now: DateTime<Local>) -> String {
    let name = match head {
        OriginalHead::Branch(name) => name.as_str(),
        OriginalHead::DetachedAt(sha) => short_sha(sha),
    };
    format!(
        "{}{}__{}",
        STASH_PREFIX,
        now.format("%Y%m%d-%H%M%S%.3f"),
        name
    )
}

struct Started {
    ctx: RunContext,
    stashed: bool,
}

/// Updates every branch in order inside a stash-and-restore envelope.
///
/// Precondition: nothing else touches the working tree while the run is in progress.
pub fn run(
    specs: &[BranchSpec],
    remote: &str,
    vcs: &impl Vcs,
    scripts: &impl ScriptRunner,
    callbacks: &impl UpdateCallbacks,
) -> RunReport {
    let start = Instant::now();
    let mut report = RunReport {
        results: Vec::with_capacity(specs.len()),
        status: RunStatus::Completed,
        original_head: None,
        stash: None,
        duration: Duration::ZERO,
    };

    let Started { ctx, stashed } = match begin(remote, vcs, callbacks) {
        Ok(started) => started,
        Err(e) => {
            let error = format!("{:#}", e);
            callbacks.on_message(Level::Error, &error);
            report.status = RunStatus::StartFailed { error };
            report.duration = start.elapsed();
            return report;
        }
    };
    report.original_head = Some(ctx.original_head.clone());
    report.stash = stashed.then(|| ctx.stash_label.clone());

    if let Err(error) = update_all(specs, &ctx, vcs, scripts, callbacks, &mut report.results) {
        callbacks.on_message(Level::Exception, &error);
        if let Some(hint) = report.recovery_hint() {
            callbacks.on_message(Level::Error, &hint);
        }
        report.status = RunStatus::Aborted { error };
        report.duration = start.elapsed();
        return report;
    }

    if let Err(e) = restore(&ctx, stashed, vcs, callbacks) {
        let error = format!("{:#}", e);
        callbacks.on_message(Level::Error, &error);
        if let Some(hint) = report.recovery_hint() {
            callbacks.on_message(Level::Error, &hint);
        }
        report.status = RunStatus::RestoreFailed { error };
    } else {
        callbacks.on_step(&UpdateStep::Completed);
    }
    report.duration = start.elapsed();
    report
}

/// Captures the original head, stashes local changes and resolves the committer.
fn begin(
    remote: &str,
    vcs: &impl Vcs,
    callbacks: &impl UpdateCallbacks,
) -> anyhow::Result<Started> {
    let branch = vcs.current_branch()?;
    let original_head = if branch == DETACHED_HEAD {
        OriginalHead::DetachedAt(vcs.current_commit()?)
    } else {
        OriginalHead::Branch(branch)
    };

    let stash_label = stash_label(&original_head, Local::now());
    callbacks.on_step(&UpdateStep::Stashing {
        label: stash_label.clone(),
    });
    let stashed = vcs.stash_push(&stash_label)?;
    if !stashed {
        callbacks.on_message(Level::Info, "No local changes to stash");
    }

    let committer_identity = match vcs.config_get(COMMITTER_IDENTITY_KEY) {
        Ok(identity) => identity,
        Err(e) => {
            callbacks.on_message(
                Level::Warning,
                &format!("Could not read {}: {:#}", COMMITTER_IDENTITY_KEY, e),
            );
            None
        }
    };

    Ok(Started {
        ctx: RunContext {
            remote: remote.to_string(),
            original_head,
            stash_label,
            committer_identity,
        },
        stashed,
    })
}

/// Fetches once, then updates each spec. `Err` carries the fatal error message.
fn update_all(
    specs: &[BranchSpec],
    ctx: &RunContext,
    vcs: &impl Vcs,
    scripts: &impl ScriptRunner,
    callbacks: &impl UpdateCallbacks,
    results: &mut Vec<BranchResult>,
) -> Result<(), String> {
    callbacks.on_step(&UpdateStep::Fetching {
        remote: ctx.remote.clone(),
    });
    vcs.fetch(&ctx.remote).map_err(|e| format!("{:#}", e))?;

    for spec in specs {
        let result =
            update::update_timed(spec, ctx, vcs, scripts, callbacks).map_err(|e| e.to_string())?;
        callbacks.on_complete(&result);
        results.push(result);
    }
    Ok(())
}

/// Returns to the original head and applies (never pops) this run's stash.
fn restore(
    ctx: &RunContext,
    stashed: bool,
    vcs: &impl Vcs,
    callbacks: &impl UpdateCallbacks,
) -> anyhow::Result<()> {
    callbacks.on_step(&UpdateStep::RestoringHead {
        target: ctx.original_head.display(),
    });
    match &ctx.original_head {
        OriginalHead::Branch(name) => vcs.checkout(name)?,
        OriginalHead::DetachedAt(sha) => vcs.checkout_detached(sha)?,
    }

    if stashed {
        callbacks.on_step(&UpdateStep::ApplyingStash {
            label: ctx.stash_label.clone(),
        });
        vcs.stash_apply(&ctx.stash_label)?;
    }
    Ok(())
}
