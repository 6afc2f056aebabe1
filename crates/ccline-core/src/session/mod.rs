//! Append-only session history and its read-side summarizer.

mod logger;
mod stats;

pub use logger::{SessionLogger, SessionRecord, LOG_FILE};
pub use stats::{load_records, summarize, DaySummary, StatsReport};
