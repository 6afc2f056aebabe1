//! Detached background refresh with debounce and a hard wall-clock deadline.
//!
//! The refresh itself runs in a re-exec of the current binary (hidden
//! `refresh <key>` subcommand) in its own process group with null stdio, so
//! it survives the parent printing and exiting. A `.bglock` marker per key
//! debounces repeated handoffs: while a marker younger than
//! [`DEBOUNCE_WINDOW`] exists, no new worker starts. The worker removes the
//! marker when it finishes, fails, or hits [`WORKER_DEADLINE`]; a worker
//! that dies harder than that stops suppressing once the marker ages out.

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, warn};

use super::fetchers;
use crate::cache::{CacheStore, ResourceKey};

/// Minimum spacing between background attempts per key.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(60);

/// Hard kill deadline for one background refresh.
pub const WORKER_DEADLINE: Duration = Duration::from_secs(45);

/// Hand a stale-but-present resource off to a detached worker.
pub fn request(store: &CacheStore, key: ResourceKey) {
    if !debounce_begin(store.dir(), key) {
        debug!("background refresh of {key} already pending");
        return;
    }
    if let Err(e) = spawn_worker(store.dir(), key) {
        warn!("cannot spawn background refresh for {key}: {e}");
        debounce_end(store.dir(), key);
    }
}

/// Body of the detached worker (the hidden `refresh` subcommand).
///
/// The deadline is enforced here rather than cooperatively: the fetch's own
/// subprocess is spawned with `kill_on_drop`, so timing out the future kills
/// a hung external call, and the worker process exits right after.
pub async fn run_worker(store: &CacheStore, key: ResourceKey) {
    let outcome = tokio::time::timeout(WORKER_DEADLINE, fetchers::fetch_resource(store, key)).await;
    if outcome.is_err() {
        debug!(
            "background refresh of {key} hit the {}s deadline",
            WORKER_DEADLINE.as_secs()
        );
    }
    debounce_end(store.dir(), key);
}

/// Debounce marker path for `key` under `dir`.
pub fn marker_path(dir: &Path, key: ResourceKey) -> PathBuf {
    dir.join(format!("{}.bglock", key.as_str()))
}

/// Claim the debounce marker. Returns false while a recent attempt is still
/// pending (or the marker cannot be written).
fn debounce_begin(dir: &Path, key: ResourceKey) -> bool {
    let marker = marker_path(dir, key);
    if let Some(age) = file_age(&marker) {
        if age < DEBOUNCE_WINDOW {
            return false;
        }
    }
    fs::write(&marker, std::process::id().to_string()).is_ok()
}

/// Drop the debounce marker, best-effort.
fn debounce_end(dir: &Path, key: ResourceKey) {
    let _ = fs::remove_file(marker_path(dir, key));
}

fn spawn_worker(dir: &Path, key: ResourceKey) -> std::io::Result<()> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .arg("refresh")
        .arg(key.as_str())
        .env("CCLINE_CACHE_DIR", dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()?;
    Ok(())
}

fn file_age(path: &Path) -> Option<Duration> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()?
        .elapsed()
        .ok()
}
