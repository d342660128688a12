// file: src/repository/workspace.rs
// description: per-repository scratch directory removed when the guard drops
// reference: https://docs.rs/sha2

use crate::error::{ConnectError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn hash_clone_url(clone_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(clone_url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Where a clone of `clone_url` lives under `scratch_root`. Same url, same path.
pub fn workspace_path(scratch_root: &Path, clone_url: &str) -> PathBuf {
    scratch_root.join(hash_clone_url(clone_url))
}

/// Exclusively owned clone directory. Dropping it removes the directory and
/// everything under it, whether processing succeeded or not.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn create(scratch_root: &Path, clone_url: &str) -> Result<Self> {
        let path = workspace_path(scratch_root, clone_url);

        // leftovers from a crashed run would make the clone fail
        if path.exists() {
            debug!(path = %path.display(), "removing stale workspace");
            fs::remove_dir_all(&path).map_err(|source| ConnectError::Workspace {
                path: path.clone(),
                source,
            })?;
        }

        fs::create_dir_all(&path).map_err(|source| ConnectError::Workspace {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove workspace"),
        }
    }
}
