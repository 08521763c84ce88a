//! Process working-directory guard for the binary.

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Switches the process into a directory and switches back when dropped.
#[derive(Debug)]
pub struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    pub fn enter(target: &Path) -> anyhow::Result<Self> {
        let original = std::env::current_dir().context("Failed to read working directory")?;
        std::env::set_current_dir(target)
            .with_context(|| format!("Failed to enter '{}'", target.display()))?;
        Ok(Self { original })
    }

    #[must_use]
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        // Nothing sensible to do if the original directory vanished.
        let _ = std::env::set_current_dir(&self.original);
    }
}
