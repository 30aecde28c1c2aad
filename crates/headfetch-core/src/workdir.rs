//! Working directory lifecycle.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FetchError, FetchResult};

/// When the working directory is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Remove only after digests were computed; a failed run leaves its
    /// artifacts on disk.
    #[default]
    OnSuccess,
    /// Remove on every exit path, including errors.
    Always,
}

/// The directory a run downloads into. Dropping it removes the directory
/// when the policy is [`CleanupPolicy::Always`] and it was not already removed.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    policy: CleanupPolicy,
    removed: bool,
}

impl WorkDir {
    /// Create `path` (and missing parents) if it does not exist yet.
    pub fn create(path: &Path, policy: CleanupPolicy) -> FetchResult<Self> {
        std::fs::create_dir_all(path).map_err(|source| FetchError::DirectorySetup {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("working directory ready: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            policy,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Remove the directory and everything in it.
    pub fn remove(mut self) -> FetchResult<()> {
        self.removed = true;
        remove_tree(&self.path)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.removed || self.policy != CleanupPolicy::Always {
            return;
        }
        if let Err(e) = remove_tree(&self.path) {
            tracing::warn!("{}", e);
        } else {
            tracing::debug!("removed working directory {} on early exit", self.path.display());
        }
    }
}

fn remove_tree(path: &Path) -> FetchResult<()> {
    std::fs::remove_dir_all(path).map_err(|source| FetchError::Cleanup {
        path: path.to_path_buf(),
        source,
    })
}
