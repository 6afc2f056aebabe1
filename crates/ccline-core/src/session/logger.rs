//! Throttled, size-rotated session history in ndjson format.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SessionLogSettings;
use crate::snapshot::{ModelFamily, Snapshot};

pub const LOG_FILE: &str = "sessions.jsonl";
const MARKER_FILE: &str = "session_last_ts";

/// Minimum spacing between logged entries.
const THROTTLE: Duration = Duration::from_secs(60);

/// One logged invocation, kept compact because the log is append-heavy and
/// rotation-bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// UTC timestamp, second resolution
    pub ts: String,
    /// Model family key
    pub m: String,
    /// Cumulative session cost, rounded to cents
    pub c: f64,
    /// Total tokens (input + output)
    pub t: u64,
    /// Session duration in milliseconds
    pub d: u64,
    /// Working-directory basename
    pub p: String,
}

/// Appends at most one [`SessionRecord`] per minute to the session log.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    dir: PathBuf,
    max_bytes: u64,
    max_entries: usize,
}

impl SessionLogger {
    pub fn new(dir: &Path, settings: &SessionLogSettings) -> Self {
        Self {
            dir: dir.to_path_buf(),
            max_bytes: settings.max_bytes,
            max_entries: settings.max_entries,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(MARKER_FILE)
    }

    /// Append one record for this invocation unless one was logged within
    /// the last minute. All failures are swallowed; logging must never
    /// degrade the render.
    pub fn record(&self, snapshot: &Snapshot, now: DateTime<Utc>) {
        if self.throttled(now) {
            return;
        }

        let record = SessionRecord {
            ts: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            m: ModelFamily::detect(&snapshot.model.id).key().to_string(),
            c: (snapshot.total_cost_usd() * 100.0).round() / 100.0,
            t: snapshot.total_tokens(),
            d: snapshot.total_duration_ms(),
            p: project_name(snapshot),
        };

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(_) => return,
        };

        if let Err(e) = self.append(&line) {
            debug!("session log append failed: {e}");
            return;
        }
        let _ = fs::write(self.marker_path(), now.timestamp().to_string());
        self.maybe_rotate();
    }

    fn throttled(&self, now: DateTime<Utc>) -> bool {
        let last: Option<i64> = fs::read_to_string(self.marker_path())
            .ok()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .map(|secs| secs as i64);
        match last {
            Some(last) => (now.timestamp() - last) < THROTTLE.as_secs() as i64,
            None => false,
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{line}")
    }

    /// Keep only the newest `max_entries` lines once the file outgrows
    /// `max_bytes`.
    fn maybe_rotate(&self) {
        let path = self.log_path();
        let size = match fs::metadata(&path) {
            Ok(m) => m.len(),
            Err(_) => return,
        };
        if size <= self.max_bytes {
            return;
        }

        let Ok(content) = fs::read_to_string(&path) else {
            return;
        };
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() <= self.max_entries {
            return;
        }

        let keep = &lines[lines.len() - self.max_entries..];
        let _ = fs::write(&path, format!("{}\n", keep.join("\n")));
    }
}

fn project_name(snapshot: &Snapshot) -> String {
    let dir = snapshot
        .workspace
        .current_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok());
    dir.and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> Snapshot {
        Snapshot::from_reader(
            r#"{
                "model": {"id": "claude-opus-4-6"},
                "context_window": {"total_input_tokens": 100000, "total_output_tokens": 30000},
                "cost": {"total_cost_usd": 5.0, "total_duration_ms": 600000},
                "workspace": {"current_dir": "/home/user/myproject"}
            }"#
            .as_bytes(),
        )
        .unwrap()
    }

    fn logger(dir: &Path) -> SessionLogger {
        SessionLogger::new(dir, &SessionLogSettings::default())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn records_a_compact_entry() {
        let dir = tempfile::tempdir().unwrap();
        logger(dir.path()).record(&snapshot(), at(1_760_000_000));

        let content = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        let entry: SessionRecord = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(entry.m, "opus");
        assert_eq!(entry.c, 5.0);
        assert_eq!(entry.t, 130_000);
        assert_eq!(entry.d, 600_000);
        assert_eq!(entry.p, "myproject");
    }

    #[test]
    fn second_call_within_a_minute_is_throttled() {
        let dir = tempfile::tempdir().unwrap();
        let log = logger(dir.path());
        log.record(&snapshot(), at(1_760_000_000));
        log.record(&snapshot(), at(1_760_000_030));

        let content = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn calls_a_minute_apart_both_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = logger(dir.path());
        log.record(&snapshot(), at(1_760_000_000));
        log.record(&snapshot(), at(1_760_000_065));

        let content = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn oversized_log_keeps_only_the_newest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SessionLogSettings {
            max_bytes: 200,
            max_entries: 3,
        };
        let log = SessionLogger::new(dir.path(), &settings);
        for i in 0..10 {
            log.record(&snapshot(), at(1_760_000_000 + i * 61));
        }

        let content = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        // Newest entries survive.
        let last: SessionRecord = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last.ts, at(1_760_000_000 + 9 * 61).format("%Y-%m-%dT%H:%M:%SZ").to_string());
    }

    #[test]
    fn corrupt_marker_does_not_block_logging() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MARKER_FILE), "garbage").unwrap();
        logger(dir.path()).record(&snapshot(), at(1_760_000_000));
        assert!(dir.path().join(LOG_FILE).exists());
    }
}
