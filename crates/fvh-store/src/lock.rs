//! Advisory lock serializing access to the metadata document.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use fvh_core::{FvhError, Result};

/// Held for the duration of a read or read-modify-write cycle.
///
/// The lock is released when the guard is dropped, on every exit path.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
}

impl RepoLock {
    /// Block until an exclusive lock is held.
    pub fn exclusive(path: &Path) -> Result<Self> {
        let lock = Self::open(path)?;
        FileExt::lock_exclusive(&lock.file).map_err(|e| FvhError::io(path, e))?;
        tracing::trace!(path = %path.display(), "acquired exclusive lock");
        Ok(lock)
    }

    /// Block until a shared lock is held.
    pub fn shared(path: &Path) -> Result<Self> {
        let lock = Self::open(path)?;
        FileExt::lock_shared(&lock.file).map_err(|e| FvhError::io(path, e))?;
        tracing::trace!(path = %path.display(), "acquired shared lock");
        Ok(lock)
    }

    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                // The lock lives inside the repository directory
                std::io::ErrorKind::NotFound => FvhError::RepositoryNotFound {
                    path: path.to_path_buf(),
                },
                _ => FvhError::io(path, e),
            })?;
        Ok(Self { file })
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        // The file stays in place; removing it would race with waiters
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exclusive_lock_blocks_second_try() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lock");

        let held = RepoLock::exclusive(&path).unwrap();
        let other = File::open(&path).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());

        drop(held);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn test_shared_locks_coexist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lock");

        let _a = RepoLock::shared(&path).unwrap();
        let _b = RepoLock::shared(&path).unwrap();

        // Readers still exclude writers
        let other = File::open(&path).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = RepoLock::exclusive(&temp.path().join("gone/lock")).unwrap_err();
        assert!(matches!(err, FvhError::RepositoryNotFound { .. }));
    }
}
