//! Keeps local git branches rebased on their remote counterparts.
//!
//! For every branch listed in `.upbase/.upbase.yaml` a run:
//! - Checks out the local branch and rebases it onto `<remote>/<remote_branch>`
//! - Optionally force-pushes it, if the local committer is allowed to
//! - Optionally runs a post-update script
//!
//! Local changes are stashed under a unique label for the whole run and the
//! original branch and stash are restored at the end.

pub mod auth;
pub mod config;
pub mod constants;
pub mod git;
pub mod manifest;
pub mod output;
pub mod run;
pub mod script;
pub mod update;
pub mod vcs;
pub mod workdir;

#[cfg(test)]
mod testing;
