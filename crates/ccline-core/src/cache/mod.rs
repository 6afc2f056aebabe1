//! Per-resource JSON caches shared between concurrent invocations.
//!
//! Three well-known resources live in one cache directory, each as a single
//! JSON document whose filesystem mtime doubles as its freshness timestamp.
//! Writers replace documents wholesale via atomic rename; readers tolerate
//! missing or corrupt files. Companion `.lock` / `.bglock` files provide the
//! only cross-process mutual exclusion.

mod lock;
mod store;

pub use lock::LockGuard;
pub use store::CacheStore;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::CacheSettings;

/// The three cached external resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// OAuth usage limits from the Anthropic API (5h / weekly meters).
    Limits,
    /// Daily usage accounting from the `ccusage` CLI.
    Usage,
    /// LiteLLM model pricing table.
    Pricing,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 3] = [Self::Limits, Self::Usage, Self::Pricing];

    /// Stable identifier, used for file names and the worker CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limits => "limits",
            Self::Usage => "usage",
            Self::Pricing => "pricing",
        }
    }

    /// Cache file name under the cache directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Limits => "limits.json",
            Self::Usage => "usage.json",
            Self::Pricing => "pricing.json",
        }
    }

    /// Configured time-to-live for this resource.
    pub fn ttl(self, cache: &CacheSettings) -> Duration {
        let secs = match self {
            Self::Limits => cache.limits_ttl_secs,
            Self::Usage => cache.usage_ttl_secs,
            Self::Pricing => cache.pricing_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Whether a stale-but-present cache may be refreshed out-of-band.
    ///
    /// Limits block briefly so the first paint after expiry has data; the
    /// other two already show *something* and must never make an interactive
    /// render wait on a network call.
    pub fn allow_background(self) -> bool {
        matches!(self, Self::Usage | Self::Pricing)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized resource names on the worker CLI.
#[derive(Debug, Error)]
#[error("unknown resource key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for ResourceKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limits" => Ok(Self::Limits),
            "usage" => Ok(Self::Usage),
            "pricing" => Ok(Self::Pricing),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

/// Resolve the shared cache directory.
///
/// `CCLINE_CACHE_DIR` overrides (also how detached refresh workers inherit
/// the parent's directory); otherwise a fixed subdirectory of the system
/// temp dir, shared by every invocation of the current user.
pub fn default_cache_dir() -> PathBuf {
    match std::env::var("CCLINE_CACHE_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("ccline"),
    }
}
