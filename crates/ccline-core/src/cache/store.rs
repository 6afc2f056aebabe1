//! Best-effort JSON cache files with mtime-based staleness.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use super::ResourceKey;

/// Read/write access to the shared cache directory.
///
/// Reads never fail loudly: a missing, empty, or unparseable document is
/// indistinguishable from an absent one. Writes go through [`write_atomic`]
/// only, so concurrent readers never observe a partially-written file.
///
/// [`write_atomic`]: CacheStore::write_atomic
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at `dir`, creating the directory best-effort.
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            debug!("cannot create cache dir {}: {e}", dir.display());
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache document for `key`.
    pub fn path(&self, key: ResourceKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// True when no document exists for `key` or its age exceeds `ttl`.
    pub fn is_stale(&self, key: ResourceKey, ttl: Duration) -> bool {
        let mtime = match fs::metadata(self.path(key)).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(_) => return true,
        };
        // An mtime in the future reads as age zero, i.e. fresh.
        mtime.elapsed().map(|age| age > ttl).unwrap_or(false)
    }

    /// Best-effort read of the last successful payload for `key`.
    pub fn read(&self, key: ResourceKey) -> Option<Value> {
        let bytes = fs::read(self.path(key)).ok()?;
        if bytes.is_empty() {
            return None;
        }
        serde_json::from_slice(&bytes).ok()
    }

    /// Atomically replace the document for `key`.
    ///
    /// Stages to a sibling temp file and renames over the destination, so a
    /// crash mid-write leaves the previous document intact. Callers go
    /// through the refresh layer; consumers never write directly.
    pub fn write_atomic(&self, key: ResourceKey, bytes: &[u8]) -> Result<()> {
        let dest = self.path(key);
        let staging = self.dir.join(format!("{}.tmp", key.as_str()));
        fs::write(&staging, bytes)
            .with_context(|| format!("staging cache write for {key}"))?;
        fs::rename(&staging, &dest)
            .with_context(|| format!("committing cache write for {key}"))?;
        Ok(())
    }
}
