//! Post-update scripts: shell commands run after a branch was updated.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptFailure {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}{}", format_stderr(.stderr))]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl ScriptFailure {
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            ScriptFailure::Spawn { command, .. } | ScriptFailure::Exit { command, .. } => command,
        }
    }
}

/// Runs an ordered command sequence, stopping at the first failure.
pub trait ScriptRunner {
    fn run(&self, commands: &[String]) -> Result<(), ScriptFailure>;
}

/// Runs each command through the host shell inside the repository directory.
#[derive(Debug, Clone)]
pub struct ShellScriptRunner {
    dir: PathBuf,
    /// Inherit stdout/stderr instead of capturing them.
    stream_output: bool,
}

impl ShellScriptRunner {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, stream_output: bool) -> Self {
        Self {
            dir: dir.into(),
            stream_output,
        }
    }

    fn run_one(&self, command: &str) -> Result<(), ScriptFailure> {
        let mut cmd = shell_command(command);
        cmd.current_dir(&self.dir).stdin(Stdio::null());

        let spawn_failed = |source| ScriptFailure::Spawn {
            command: command.to_string(),
            source,
        };

        let (status, stderr) = if self.stream_output {
            (cmd.status().map_err(spawn_failed)?, String::new())
        } else {
            let output = cmd.output().map_err(spawn_failed)?;
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            (output.status, stderr)
        };

        if status.success() {
            Ok(())
        } else {
            Err(ScriptFailure::Exit {
                command: command.to_string(),
                status,
                stderr,
            })
        }
    }
}

impl ScriptRunner for ShellScriptRunner {
    fn run(&self, commands: &[String]) -> Result<(), ScriptFailure> {
        commands.iter().try_for_each(|command| self.run_one(command))
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}
