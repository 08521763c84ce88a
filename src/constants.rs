//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic strings throughout the codebase.

/// Remote used when the configuration file does not name one.
pub const DEFAULT_REMOTE: &str = "origin";

/// Configuration file location, relative to the target repository.
pub const DEFAULT_CONFIG_PATH: &str = ".upbase/.upbase.yaml";

/// Environment variable naming the target repository.
///
/// Example: `UPBASE_REPO=~/src/project upbase`
pub const REPO_ENV_VAR: &str = "UPBASE_REPO";

/// Prefix of every stash entry created by a run.
pub const STASH_PREFIX: &str = "upbase_";

/// Git config key holding the identity compared against `allowed_to_push`.
pub const COMMITTER_IDENTITY_KEY: &str = "user.email";

/// What `git rev-parse --abbrev-ref HEAD` prints on a detached checkout.
pub const DETACHED_HEAD: &str = "HEAD";

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
