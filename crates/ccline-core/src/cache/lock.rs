//! Advisory, non-blocking, filesystem-visible exclusive locks.
//!
//! One lock file per resource key, colocated with the cache document.
//! Ownership is the pair of (path exists, OS exclusive advisory lock held on
//! its descriptor), so a concurrent manual invocation the runtime knows
//! nothing about still observes the same exclusion. A lock path whose mtime
//! is older than [`ORPHAN_AGE`] belonged to a crashed holder and is unlinked
//! by the next contender.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use tracing::debug;

use super::ResourceKey;

/// Locks untouched for longer than this are reclaimable by anyone.
pub const ORPHAN_AGE: Duration = Duration::from_secs(120);

/// Held exclusive lock on a resource key.
///
/// Dropping the guard performs the same best-effort cleanup as
/// [`release`](LockGuard::release); failures are swallowed because orphan
/// reclamation is the backstop.
#[derive(Debug)]
pub struct LockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl LockGuard {
    /// Attempt to take the lock for `key` without blocking.
    ///
    /// Returns `None` when another process holds it. That is the defined
    /// "someone else is refreshing" state, not an error.
    pub fn try_acquire(dir: &Path, key: ResourceKey) -> Option<Self> {
        let path = lock_path(dir, key);
        reclaim_orphan(&path);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .ok()?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Some(Self {
                file: Some(file),
                path,
            }),
            Err(e) => {
                if e.kind() != ErrorKind::WouldBlock {
                    debug!("lock {} unavailable: {e}", path.display());
                }
                None
            }
        }
    }

    /// Unlock, close, and remove the lock path.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
            drop(file);
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Lock file path for `key` under `dir`.
pub fn lock_path(dir: &Path, key: ResourceKey) -> PathBuf {
    dir.join(format!("{}.lock", key.as_str()))
}

/// Unlink the lock path if its last touch is older than [`ORPHAN_AGE`].
fn reclaim_orphan(path: &Path) {
    let age = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|mtime| mtime.elapsed().ok());
    if let Some(age) = age {
        if age > ORPHAN_AGE {
            debug!("reclaiming orphaned lock {}", path.display());
            let _ = fs::remove_file(path);
        }
    }
}
