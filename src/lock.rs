//! File-based locking around cache updates.
//!
//! Uses flock-style advisory locking so two fetches never merge into the
//! same cache file at once.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// A guard that holds an exclusive lock next to a cache file.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Lock file path for a cache file: `<cache>.lock`.
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquire an exclusive lock for `target` without blocking.
    /// Returns an error if another process holds it.
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = Self::lock_path(target);

        // create+read+write without truncation avoids a race between create and lock
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another iplists process is updating {:?}.\n\
                 If you believe this is an error, remove the lock file: {:?}",
                target,
                path
            )
        })?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
