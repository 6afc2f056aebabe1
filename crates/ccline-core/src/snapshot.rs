//! The per-invocation usage snapshot read from standard input.
//!
//! One JSON document per invocation. Every field is optional on the wire;
//! missing or null values default to zero/absent so a sparse document still
//! renders. The snapshot is immutable for the lifetime of the invocation and
//! never persisted as-is; only derived fields reach the session log.

use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Snapshot of the current session, as delivered by the status-line hook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub context_window: ContextWindow,
    #[serde(default)]
    pub cost: CostInfo,
    #[serde(default)]
    pub workspace: WorkspaceInfo,
}

/// Model identity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Context-window size and token counters
#[derive(Debug, Clone, Deserialize)]
pub struct ContextWindow {
    #[serde(default = "default_window_size")]
    pub context_window_size: u64,
    /// May be absent or null early in a session.
    #[serde(default)]
    pub current_usage: Option<CurrentUsage>,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
}

/// Token counters for the live context window
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CurrentUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

/// Cumulative session cost and duration
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CostInfo {
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub total_duration_ms: Option<u64>,
}

/// Workspace the session runs in
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub current_dir: Option<String>,
}

fn default_window_size() -> u64 {
    200_000
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            context_window_size: default_window_size(),
            current_usage: None,
            total_input_tokens: 0,
            total_output_tokens: 0,
        }
    }
}

impl Snapshot {
    /// Parse one snapshot document from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).context("parsing status snapshot")
    }

    /// Live context-window counters, zeroed when absent.
    pub fn current_usage(&self) -> CurrentUsage {
        self.context_window.current_usage.unwrap_or_default()
    }

    /// Cumulative cost in USD; zero when the feed omits it.
    pub fn total_cost_usd(&self) -> f64 {
        self.cost.total_cost_usd.unwrap_or(0.0)
    }

    /// Cumulative session duration in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.cost.total_duration_ms.unwrap_or(0)
    }

    /// Total tokens across the whole session (input + output).
    pub fn total_tokens(&self) -> u64 {
        self.context_window.total_input_tokens + self.context_window.total_output_tokens
    }
}

/// Claude model families with distinct pricing and weekly sub-limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Opus,
    Sonnet,
    Haiku,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [Self::Opus, Self::Sonnet, Self::Haiku];

    /// Detect the family from a model id. Unknown ids resolve to Opus,
    /// matching the most conservative pricing assumption.
    pub fn detect(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();
        if id.contains("sonnet") {
            Self::Sonnet
        } else if id.contains("haiku") {
            Self::Haiku
        } else {
            Self::Opus
        }
    }

    /// Lowercase key, as used in limits payloads (`seven_day_<key>`) and the
    /// session log.
    pub fn key(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }

    /// Human display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Opus => "Opus 4.6",
            Self::Sonnet => "Sonnet 4.5",
            Self::Haiku => "Haiku 4.5",
        }
    }

    /// Single-letter tag for the weekly sub-limit trio.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Opus => "O",
            Self::Sonnet => "S",
            Self::Haiku => "H",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn family_detection() {
        assert_eq!(
            ModelFamily::detect("claude-opus-4-6-20250514"),
            ModelFamily::Opus
        );
        assert_eq!(
            ModelFamily::detect("claude-sonnet-4-5-20250929"),
            ModelFamily::Sonnet
        );
        assert_eq!(
            ModelFamily::detect("claude-haiku-4-5-20251001"),
            ModelFamily::Haiku
        );
        assert_eq!(ModelFamily::detect("unknown-model-x"), ModelFamily::Opus);
    }

    #[test]
    fn full_snapshot_parses() {
        let raw = r#"{
            "model": {"id": "claude-opus-4-6-20250514", "display_name": "Opus"},
            "context_window": {
                "context_window_size": 200000,
                "current_usage": {
                    "input_tokens": 50000,
                    "output_tokens": 10000,
                    "cache_creation_input_tokens": 20000,
                    "cache_read_input_tokens": 5000
                },
                "total_input_tokens": 100000,
                "total_output_tokens": 30000
            },
            "cost": {"total_cost_usd": 3.5, "total_duration_ms": 1200000},
            "workspace": {"current_dir": "/home/user/project"}
        }"#;
        let snap = Snapshot::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(snap.model.id, "claude-opus-4-6-20250514");
        assert_eq!(snap.current_usage().input_tokens, 50_000);
        assert_eq!(snap.total_cost_usd(), 3.5);
        assert_eq!(snap.total_tokens(), 130_000);
    }

    #[test]
    fn sparse_snapshot_defaults() {
        let snap = Snapshot::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(snap.context_window.context_window_size, 200_000);
        assert_eq!(snap.current_usage().input_tokens, 0);
        assert_eq!(snap.total_cost_usd(), 0.0);
        assert_eq!(snap.total_duration_ms(), 0);
    }

    #[test]
    fn null_fields_default() {
        let raw = r#"{
            "model": {"id": "claude-sonnet-4-5"},
            "context_window": {"current_usage": null},
            "cost": {"total_cost_usd": null, "total_duration_ms": null}
        }"#;
        let snap = Snapshot::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(snap.current_usage().cache_read_input_tokens, 0);
        assert_eq!(snap.total_cost_usd(), 0.0);
    }

    #[test]
    fn garbage_input_is_an_error() {
        assert!(Snapshot::from_reader("not json".as_bytes()).is_err());
    }
}
