//! Push authorization: only the configured committer may force-push a branch.
//!
//! This guards against pushing from the wrong machine or account by
//! misconfiguration. It is not a security boundary.

use crate::manifest::PushConfig;
use crate::update::{Level, UpdateCallbacks};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// `push_to_remote` is present but names nobody.
    MissingAllowedToPush,
    IdentityMismatch {
        allowed: String,
        committer: Option<String>,
    },
}

impl Denial {
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Denial::MissingAllowedToPush => Level::Error,
            Denial::IdentityMismatch { .. } => Level::Warning,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::MissingAllowedToPush => write!(
                f,
                "configuration error: `push_to_remote.allowed_to_push` is required to push"
            ),
            Denial::IdentityMismatch { allowed, committer } => write!(
                f,
                "only '{}' may push, current committer is '{}'",
                allowed,
                committer.as_deref().unwrap_or("<unset>")
            ),
        }
    }
}

/// Decides whether `committer` may push under `push`. Exact, case-sensitive match.
pub fn check(push: &PushConfig, committer: Option<&str>) -> Result<(), Denial> {
    let Some(allowed) = push.allowed_to_push.as_deref() else {
        return Err(Denial::MissingAllowedToPush);
    };
    if committer == Some(allowed) {
        Ok(())
    } else {
        Err(Denial::IdentityMismatch {
            allowed: allowed.to_string(),
            committer: committer.map(str::to_string),
        })
    }
}

/// Runs [`check`] and reports a denial for `local_branch` through `callbacks`.
pub fn authorize(
    local_branch: &str,
    push: &PushConfig,
    committer: Option<&str>,
    callbacks: &impl UpdateCallbacks,
) -> bool {
    match check(push, committer) {
        Ok(()) => true,
        Err(denial) => {
            callbacks.on_message(
                denial.level(),
                &format!("Not pushing '{}': {}", local_branch, denial),
            );
            false
        }
    }
}
