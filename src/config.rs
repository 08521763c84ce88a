//! Output settings chosen on the command line.

use crate::git::{self, GitLogger};

/// How chatty a run is. Built once in `main` and handed to every printer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub verbosity: Verbosity,
}

impl Config {
    /// Resolves the `--quiet`/`--verbose` pair; quiet wins when both are set.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Self { verbosity }
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Post-script output goes straight to the terminal in verbose mode
    /// instead of being captured for the failure report.
    #[must_use]
    pub fn streams_post_script(&self) -> bool {
        self.is_verbose()
    }

    /// `--verbose` echoes each git invocation before it runs.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors and the one-line summary only.
    Quiet,
    #[default]
    Normal,
    /// Adds git command echo and live post-script output.
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Config::from_flags(false, false).verbosity, Verbosity::Normal);
        assert_eq!(Config::from_flags(false, true).verbosity, Verbosity::Verbose);
        assert_eq!(Config::from_flags(true, false).verbosity, Verbosity::Quiet);
        assert_eq!(Config::from_flags(true, true).verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_only_verbose_streams_post_script_output() {
        assert!(Config::from_flags(false, true).streams_post_script());
        assert!(!Config::from_flags(false, false).streams_post_script());
        assert!(!Config::from_flags(true, true).streams_post_script());
    }

    #[test]
    fn test_git_logger_echoes_only_when_verbose() {
        assert!(std::ptr::fn_addr_eq(
            Config::from_flags(false, true).git_logger() as GitLogger,
            git::verbose_logger as GitLogger
        ));
        assert!(std::ptr::fn_addr_eq(
            Config::default().git_logger() as GitLogger,
            git::no_op_logger as GitLogger
        ));
    }
}
