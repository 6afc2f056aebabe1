//! Immutable runtime settings, optionally overridden by a TOML file.
//!
//! Defaults cover everything; `~/.claude/ccline.toml` may override numeric
//! thresholds, TTLs, and bar symbols. The value is constructed once at
//! startup and threaded as a parameter; nothing here mutates after load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default context-window safety buffer for a 200k window. Scales linearly
/// with the actual window size.
pub const CTX_BUFFER_200K: u64 = 33_000;

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Cache TTLs and the context buffer
    #[serde(default)]
    pub cache: CacheSettings,

    /// Color thresholds and tier column cut-offs
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Bar and pie glyph sets
    #[serde(default)]
    pub symbols: Symbols,

    /// Session log rotation bounds
    #[serde(default)]
    pub session_log: SessionLogSettings,
}

/// Cache-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Safety buffer subtracted from a 200k context window, scaled
    /// proportionally for other window sizes
    #[serde(default = "default_buffer_200k")]
    pub buffer_200k: u64,

    /// TTL for the usage-limits cache (seconds)
    #[serde(default = "default_limits_ttl")]
    pub limits_ttl_secs: u64,

    /// TTL for the usage-accounting cache (seconds)
    #[serde(default = "default_usage_ttl")]
    pub usage_ttl_secs: u64,

    /// TTL for the pricing-table cache (seconds)
    #[serde(default = "default_pricing_ttl")]
    pub pricing_ttl_secs: u64,
}

/// Color thresholds and responsive-layout cut-offs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Session cost (USD) at which the cost figure turns yellow
    #[serde(default = "default_cost_warn")]
    pub cost_warn: f64,

    /// Session cost (USD) at which the cost figure turns red
    #[serde(default = "default_cost_crit")]
    pub cost_crit: f64,

    /// Below this column count the compact tier is used
    #[serde(default = "default_compact_cols")]
    pub compact_cols: u16,

    /// Below this column count the ultra tier is used (no bars)
    #[serde(default = "default_ultra_cols")]
    pub ultra_cols: u16,
}

/// Configurable glyph sets for different terminals/tastes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbols {
    /// Context bar (filled, empty)
    #[serde(default = "default_ctx_symbols")]
    pub ctx: [String; 2],

    /// Limits bar (filled, empty)
    #[serde(default = "default_lim_symbols")]
    pub lim: [String; 2],

    /// Weekly pie, emptiest to fullest
    #[serde(default = "default_pie_symbols")]
    pub pie: [String; 5],
}

/// Session log rotation bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogSettings {
    /// Rotate once the log file grows past this many bytes
    #[serde(default = "default_log_max_bytes")]
    pub max_bytes: u64,

    /// Lines kept after rotation
    #[serde(default = "default_log_max_entries")]
    pub max_entries: usize,
}

fn default_buffer_200k() -> u64 {
    CTX_BUFFER_200K
}

fn default_limits_ttl() -> u64 {
    900
}

fn default_usage_ttl() -> u64 {
    60
}

fn default_pricing_ttl() -> u64 {
    86_400
}

fn default_cost_warn() -> f64 {
    0.50
}

fn default_cost_crit() -> f64 {
    1.00
}

fn default_compact_cols() -> u16 {
    120
}

fn default_ultra_cols() -> u16 {
    80
}

fn default_ctx_symbols() -> [String; 2] {
    ["◆".to_string(), "◇".to_string()]
}

fn default_lim_symbols() -> [String; 2] {
    ["◼".to_string(), "◻".to_string()]
}

fn default_pie_symbols() -> [String; 5] {
    ["○", "◔", "◑", "◕", "●"].map(str::to_string)
}

fn default_log_max_bytes() -> u64 {
    500_000
}

fn default_log_max_entries() -> usize {
    5_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            buffer_200k: default_buffer_200k(),
            limits_ttl_secs: default_limits_ttl(),
            usage_ttl_secs: default_usage_ttl(),
            pricing_ttl_secs: default_pricing_ttl(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cost_warn: default_cost_warn(),
            cost_crit: default_cost_crit(),
            compact_cols: default_compact_cols(),
            ultra_cols: default_ultra_cols(),
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            ctx: default_ctx_symbols(),
            lim: default_lim_symbols(),
            pie: default_pie_symbols(),
        }
    }
}

impl Default for SessionLogSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_log_max_bytes(),
            max_entries: default_log_max_entries(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the default config location.
    ///
    /// A missing file yields defaults. A malformed file also yields
    /// defaults with a warning, since a broken config must never take the
    /// statusline down with it.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Self::default(),
            },
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match toml::from_str::<Settings>(&raw) {
            Ok(mut settings) => {
                settings.validate();
                settings
            }
            Err(e) => {
                warn!("ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Default config file location: `~/.claude/ccline.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".claude").join("ccline.toml"))
    }

    /// Clamp nonsensical overrides back to defaults.
    pub fn validate(&mut self) {
        if self.thresholds.ultra_cols >= self.thresholds.compact_cols {
            warn!(
                "ultra_cols {} >= compact_cols {}, using defaults",
                self.thresholds.ultra_cols, self.thresholds.compact_cols
            );
            self.thresholds.ultra_cols = default_ultra_cols();
            self.thresholds.compact_cols = default_compact_cols();
        }
        if self.cache.buffer_200k >= 200_000 {
            self.cache.buffer_200k = default_buffer_200k();
        }
        if self.session_log.max_entries == 0 {
            self.session_log.max_entries = default_log_max_entries();
        }
    }
}
