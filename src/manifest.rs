//! The `.upbase.yaml` configuration file: which branches to update and how.
//!
//! Loaded and validated once at startup; the rest of the crate only sees
//! validated [`BranchSpec`]s.

use crate::constants::DEFAULT_REMOTE;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("branches[{index}]: `{field}` must not be empty")]
    EmptyField { index: usize, field: &'static str },

    #[error("`remote` must not be empty")]
    EmptyRemote,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default = "default_remote", deserialize_with = "null_as_default_remote")]
    pub remote: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branches: Vec<BranchSpec>,
}

/// One configured unit of work: rebase `local_branch` onto `<remote>/<remote_branch>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remote_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
    #[serde(default)]
    pub push_to_remote: Option<PushConfig>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_script: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    /// Committer identity required to push; pushes are denied while unset.
    #[serde(default)]
    pub allowed_to_push: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub force: bool,
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn null_as_default_remote<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_remote))
}

/// An explicit `null` means the same as leaving the field out.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branches: Vec::new(),
        }
    }
}

impl Manifest {
    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|e| match e {
            ManifestError::Parse { source, .. } => ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses and validates YAML text. An empty document is an empty manifest.
    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        let manifest = if contents.trim().is_empty() {
            Manifest::default()
        } else {
            serde_yaml::from_str(contents).map_err(|source| ManifestError::Parse {
                path: PathBuf::new(),
                source,
            })?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.remote.trim().is_empty() {
            return Err(ManifestError::EmptyRemote);
        }
        for (index, spec) in self.branches.iter().enumerate() {
            if spec.disabled {
                continue;
            }
            if spec.local_branch.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    index,
                    field: "local_branch",
                });
            }
            if spec.remote_branch.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    index,
                    field: "remote_branch",
                });
            }
        }
        Ok(())
    }
}

impl BranchSpec {
    #[must_use]
    pub fn new(local_branch: &str, remote_branch: &str) -> Self {
        Self {
            local_branch: local_branch.to_string(),
            remote_branch: remote_branch.to_string(),
            disabled: false,
            push_to_remote: None,
            post_script: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_push(mut self, allowed_to_push: Option<&str>, force: bool) -> Self {
        self.push_to_remote = Some(PushConfig {
            allowed_to_push: allowed_to_push.map(str::to_string),
            force,
        });
        self
    }

    #[must_use]
    pub fn with_post_script(mut self, commands: &[&str]) -> Self {
        self.post_script = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}
