//! Scoped working directory changes
//!
//! The process working directory is shared by every thread, so a change is
//! held under a process-wide lock for as long as the guard lives. Two guards
//! never interleave: the second `enter` blocks until the first is dropped.

use crate::error::{Result, ScaffoldError};
use parking_lot::{Mutex, MutexGuard};
use std::path::{Path, PathBuf};

static WORKING_DIR_LOCK: Mutex<()> = Mutex::new(());

/// Changes the working directory and restores the previous one on drop.
///
/// Restoration happens on every exit path, including early returns through
/// `?` and unwinding panics.
#[must_use = "the previous directory is restored as soon as the guard is dropped"]
pub struct WorkingDirGuard {
    previous: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDirGuard {
    /// Acquire the working-directory lock and switch to `dir`.
    pub fn enter(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let lock = WORKING_DIR_LOCK.lock();

        let previous = std::env::current_dir().map_err(|e| ScaffoldError::io(".", e))?;
        std::env::set_current_dir(dir).map_err(|e| ScaffoldError::io(dir, e))?;
        tracing::debug!(
            from = %previous.display(),
            to = %dir.display(),
            "changed working directory"
        );

        Ok(Self {
            previous,
            _lock: lock,
        })
    }

    /// The directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        // Runs before `_lock` is released.
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                dir = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            );
        }
    }
}

/// Run `f` with the working directory set to `dir`.
pub fn with_working_dir<T>(dir: impl AsRef<Path>, f: impl FnOnce() -> T) -> Result<T> {
    let _guard = WorkingDirGuard::enter(dir)?;
    Ok(f())
}

/// Snapshot of the working directory, read under the same lock guards hold.
///
/// Blocks while another thread holds a [`WorkingDirGuard`]. The lock is not
/// reentrant: calling this while the current thread holds a guard deadlocks.
pub fn current_dir() -> Result<PathBuf> {
    let _lock = WORKING_DIR_LOCK.lock();
    std::env::current_dir().map_err(|e| ScaffoldError::io(".", e))
}

/// `path` if absolute, else `path` joined onto `base`. Never reads the
/// process working directory.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
