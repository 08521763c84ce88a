//! Scripted collaborators for unit tests.

use crate::run::{OriginalHead, RunContext};
use crate::script::{ScriptFailure, ScriptRunner};
use crate::update::{BranchResult, Level, UpdateCallbacks, UpdateStep};
use crate::vcs::Vcs;
use std::cell::RefCell;

pub fn context(committer: &str) -> RunContext {
    RunContext {
        remote: "origin".to_string(),
        original_head: OriginalHead::Branch("main".to_string()),
        stash_label: "upbase_test__main".to_string(),
        committer_identity: Some(committer.to_string()),
    }
}

/// Records every call as a git-like command line and fails the ones
/// starting with a registered prefix.
#[derive(Debug)]
pub struct FakeVcs {
    branch: String,
    has_changes: bool,
    identity: Option<String>,
    failing: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            has_changes: false,
            identity: Some("dev@x.com".to_string()),
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeVcs {
    pub const COMMIT: &'static str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn with_changes(mut self) -> Self {
        self.has_changes = true;
        self
    }

    pub fn without_identity(mut self) -> Self {
        self.identity = None;
        self
    }

    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        let fails = self.failing.iter().any(|prefix| call.starts_with(prefix));
        self.calls.borrow_mut().push(call.clone());
        if fails {
            anyhow::bail!("git {} failed", call);
        }
        Ok(())
    }
}

impl Vcs for FakeVcs {
    fn current_branch(&self) -> anyhow::Result<String> {
        self.record("rev-parse --abbrev-ref HEAD".to_string())?;
        Ok(self.branch.clone())
    }

    fn current_commit(&self) -> anyhow::Result<String> {
        self.record("rev-parse HEAD".to_string())?;
        Ok(Self::COMMIT.to_string())
    }

    fn config_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.record(format!("config --get {}", key))?;
        Ok(self.identity.clone())
    }

    fn fetch(&self, remote: &str) -> anyhow::Result<()> {
        self.record(format!("fetch {}", remote))
    }

    fn checkout(&self, branch: &str) -> anyhow::Result<()> {
        self.record(format!("checkout {}", branch))
    }

    fn checkout_detached(&self, commit: &str) -> anyhow::Result<()> {
        self.record(format!("checkout --detach {}", commit))
    }

    fn rebase(&self, upstream: &str) -> anyhow::Result<()> {
        self.record(format!("rebase {}", upstream))
    }

    fn rebase_abort(&self) -> anyhow::Result<()> {
        self.record("rebase --abort".to_string())
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> anyhow::Result<()> {
        let flag = if force { " --force" } else { "" };
        self.record(format!("push {} {}{}", remote, branch, flag))
    }

    fn stash_push(&self, label: &str) -> anyhow::Result<bool> {
        self.record(format!("stash push {}", label))?;
        Ok(self.has_changes)
    }

    fn stash_apply(&self, label: &str) -> anyhow::Result<()> {
        self.record(format!("stash apply {}", label))
    }
}

#[derive(Debug, Default)]
pub struct FakeScripts {
    fail: bool,
    runs: RefCell<Vec<Vec<String>>>,
}

impl FakeScripts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<Vec<String>> {
        self.runs.borrow().clone()
    }
}

impl ScriptRunner for FakeScripts {
    fn run(&self, commands: &[String]) -> Result<(), ScriptFailure> {
        self.runs.borrow_mut().push(commands.to_vec());
        if self.fail {
            return Err(ScriptFailure::Spawn {
                command: commands.first().cloned().unwrap_or_default(),
                source: std::io::Error::other("scripted failure"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    steps: RefCell<Vec<String>>,
    messages: RefCell<Vec<(Level, String)>>,
    results: RefCell<Vec<BranchResult>>,
}

impl RecordingCallbacks {
    pub fn steps(&self) -> Vec<String> {
        self.steps.borrow().clone()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    pub fn results(&self) -> Vec<BranchResult> {
        self.results.borrow().clone()
    }
}

impl UpdateCallbacks for RecordingCallbacks {
    fn on_step(&self, step: &UpdateStep) {
        self.steps.borrow_mut().push(step.to_string());
    }

    fn on_message(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }

    fn on_complete(&self, result: &BranchResult) {
        self.results.borrow_mut().push(result.clone());
    }
}
