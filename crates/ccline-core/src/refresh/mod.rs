//! Single-flight cache refresh orchestration.
//!
//! `ensure` binds staleness detection, the advisory lock, and a fetch
//! function into one contract: at most one concurrent caller per key runs
//! the fetch, everyone else settles for whatever is cached. Fetch functions
//! never report errors here: they either atomically improved the cache or
//! silently didn't, which keeps this layer branch-free with respect to
//! failure kinds.

pub mod background;
pub mod credentials;
pub mod fetchers;

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStore, LockGuard, ResourceKey};
use crate::config::Settings;

/// Bounded wait per cold-start prewarm job.
const PREWARM_TIMEOUT: Duration = Duration::from_secs(30);

/// Return a usable value for `key`, refreshing first when stale.
///
/// - Fresh cache: returned immediately, no lock contention.
/// - Stale, lock unavailable: another process is refreshing; the current
///   cache (possibly absent on a first run) is returned as-is.
/// - Stale, lock acquired: refreshed synchronously, unless `background` is
///   given *and* a previous payload exists. In that case the lock is released, the
///   handoff closure runs, and the stale payload is returned without
///   waiting. First runs always block: staleness is preferable to latency
///   only when there is something stale to show.
pub async fn ensure<F, Fut>(
    store: &CacheStore,
    key: ResourceKey,
    ttl: Duration,
    fetch: F,
    background: Option<&(dyn Fn() + Sync)>,
) -> Option<Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    if !store.is_stale(key, ttl) {
        return store.read(key);
    }

    let Some(lock) = LockGuard::try_acquire(store.dir(), key) else {
        debug!("{key} is being refreshed elsewhere");
        return store.read(key);
    };

    match background {
        Some(handoff) if store.path(key).exists() => {
            lock.release();
            handoff();
        }
        _ => {
            fetch().await;
            lock.release();
        }
    }

    store.read(key)
}

/// Fan out first-time refreshes for caches that do not exist yet.
///
/// Runs once per invocation before rendering, so a cold start fills all
/// three caches concurrently instead of serially. Per-job timeouts and
/// failures are swallowed; rendering degrades to placeholders for whatever
/// is still missing.
pub async fn prewarm(store: &CacheStore, settings: &Settings) {
    let jobs: Vec<ResourceKey> = ResourceKey::ALL
        .into_iter()
        .filter(|key| {
            store.is_stale(*key, key.ttl(&settings.cache)) && !store.path(*key).exists()
        })
        .collect();
    if jobs.is_empty() {
        return;
    }

    debug!("prewarming {} cache(s)", jobs.len());
    futures_util::future::join_all(jobs.into_iter().map(|key| async move {
        let outcome = tokio::time::timeout(PREWARM_TIMEOUT, async {
            let Some(lock) = LockGuard::try_acquire(store.dir(), key) else {
                return;
            };
            fetchers::fetch_resource(store, key).await;
            lock.release();
        })
        .await;
        if outcome.is_err() {
            debug!("prewarm of {key} timed out");
        }
    }))
    .await;
}
