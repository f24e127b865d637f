//! Per-directory locks and the known-directories set.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{DashMap, DashSet};
use tracing::info;

use canonfile_core::OrganizeError;

/// One mutual-exclusion lock per destination directory.
///
/// Locks are created lazily on first request. Lookup-or-create runs under the
/// map's shard lock, so two workers asking for the same directory always get
/// the same lock object.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DirectoryLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// The lock for `dir`, creating it if needed.
    pub fn lock_for(&self, dir: &Path) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(dir) {
            return Arc::clone(lock.value());
        }
        Arc::clone(self.locks.entry(dir.to_path_buf()).or_default().value())
    }

    /// Run `f` while holding the lock for `dir`.
    ///
    /// Blocks while another caller holds the same directory. A poisoned lock
    /// is taken over: the guarded state is the directory on disk, not the
    /// mutex payload.
    pub fn with_locked<T>(&self, dir: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(dir);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of distinct directories a lock was created for.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Destination directories known to exist.
#[derive(Debug, Default)]
pub struct KnownDirectories {
    seen: DashSet<PathBuf>,
}

impl KnownDirectories {
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Make sure `dir` exists, creating it recursively if absent.
    ///
    /// Returns `true` when the directory was created by this call. In dry-run
    /// mode nothing is created; the directory is only remembered.
    pub fn ensure(&self, dir: &Path, dry_run: bool) -> Result<bool, OrganizeError> {
        if self.seen.contains(dir) {
            return Ok(false);
        }

        if dir.is_dir() {
            self.seen.insert(dir.to_path_buf());
            return Ok(false);
        }

        if dry_run {
            info!(path = %dir.display(), "would create directory");
            self.seen.insert(dir.to_path_buf());
            return Ok(false);
        }

        info!(path = %dir.display(), "creating directory");
        fs::create_dir_all(dir).map_err(|source| OrganizeError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        self.seen.insert(dir.to_path_buf());
        Ok(true)
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.seen.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
