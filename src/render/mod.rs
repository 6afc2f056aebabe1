//! Tier-aware rendering of the two status lines.
//!
//! Line builders are pure functions of the snapshot, the cached payloads,
//! and an explicit clock; all I/O happens before they run.

pub mod format;
pub mod width;

mod context_line;
mod limits_line;

pub use context_line::context_line;
pub use limits_line::limits_line;

use ccline_core::config::Thresholds;

/// Responsive rendering mode, a pure function of terminal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// <80 columns: no bars, minimal separators
    Ultra,
    /// 80-119 columns: 6-unit bars
    Compact,
    /// >=120 columns: 10-unit bars
    Full,
}

impl Tier {
    /// Recomputed every invocation; no hysteresis.
    pub fn from_columns(columns: u16, thresholds: &Thresholds) -> Self {
        if columns < thresholds.ultra_cols {
            Self::Ultra
        } else if columns < thresholds.compact_cols {
            Self::Compact
        } else {
            Self::Full
        }
    }

    /// Progress bar width for this tier, `None` when bars are off.
    pub fn bar_width(self) -> Option<usize> {
        match self {
            Self::Ultra => None,
            Self::Compact => Some(6),
            Self::Full => Some(10),
        }
    }
}
