//! Read-side summarizer for the session log.

use std::collections::BTreeMap;
use std::path::Path;

use super::logger::SessionRecord;

/// Cost drop ratio that marks a session boundary.
const SESSION_DROP_RATIO: f64 = 0.5;

/// Running maximum must exceed this before a drop counts as a boundary.
const SESSION_COST_FLOOR: f64 = 0.1;

/// Aggregated view of the session log.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub entries: usize,
    /// Approximate; see [`summarize`] for the boundary heuristic.
    pub sessions: usize,
    /// Sum of per-session peak costs.
    pub total_cost: f64,
    /// Most recent days, oldest first, at most seven.
    pub days: Vec<DaySummary>,
}

/// Per-day aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: String,
    pub max_cost: f64,
    pub max_tokens: u64,
    pub projects: Vec<String>,
}

/// Load records from an ndjson session log, skipping unparseable lines.
pub fn load_records(path: &Path) -> Vec<SessionRecord> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Aggregate the log into day summaries and an approximate session count.
///
/// A session boundary is inferred wherever the logged cumulative cost drops
/// below half the running maximum, once that maximum exceeded a small
/// floor. Cumulative cost only grows within one session, so a drop means a
/// new session started. Jagged curves can over- or under-count; this is
/// documented best-effort behavior, not an exact detector.
pub fn summarize(records: &[SessionRecord]) -> StatsReport {
    let mut session_peaks: Vec<f64> = Vec::new();
    let mut running_max = 0.0_f64;
    for record in records {
        if record.c < running_max * SESSION_DROP_RATIO && running_max > SESSION_COST_FLOOR {
            session_peaks.push(running_max);
            running_max = record.c;
        } else {
            running_max = running_max.max(record.c);
        }
    }
    if running_max > 0.0 {
        session_peaks.push(running_max);
    }

    let mut by_date: BTreeMap<&str, Vec<&SessionRecord>> = BTreeMap::new();
    for record in records {
        let date = record.ts.get(..10).unwrap_or("");
        if !date.is_empty() {
            by_date.entry(date).or_default().push(record);
        }
    }

    let days: Vec<DaySummary> = by_date
        .iter()
        .rev()
        .take(7)
        .map(|(date, entries)| {
            let mut projects: Vec<String> =
                entries.iter().map(|e| e.p.clone()).collect();
            projects.sort();
            projects.dedup();
            DaySummary {
                date: date.to_string(),
                max_cost: entries.iter().map(|e| e.c).fold(0.0, f64::max),
                max_tokens: entries.iter().map(|e| e.t).max().unwrap_or(0),
                projects,
            }
        })
        .collect();
    let mut days = days;
    days.reverse();

    StatsReport {
        entries: records.len(),
        sessions: session_peaks.len(),
        total_cost: session_peaks.iter().sum(),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(ts: &str, cost: f64, tokens: u64, project: &str) -> SessionRecord {
        SessionRecord {
            ts: ts.to_string(),
            m: "opus".to_string(),
            c: cost,
            t: tokens,
            d: 0,
            p: project.to_string(),
        }
    }

    #[test]
    fn empty_log_summarizes_to_zero() {
        let report = summarize(&[]);
        assert_eq!(report.entries, 0);
        assert_eq!(report.sessions, 0);
        assert_eq!(report.total_cost, 0.0);
    }

    #[test]
    fn monotonic_cost_is_one_session() {
        let records = vec![
            record("2026-08-01T10:00:00Z", 1.0, 1000, "a"),
            record("2026-08-01T10:05:00Z", 3.0, 2000, "a"),
            record("2026-08-01T10:10:00Z", 7.0, 3000, "a"),
        ];
        let report = summarize(&records);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.total_cost, 7.0);
    }

    #[test]
    fn cost_drop_below_half_of_peak_starts_a_new_session() {
        let records = vec![
            record("2026-08-01T10:00:00Z", 2.0, 0, "a"),
            record("2026-08-01T11:00:00Z", 6.0, 0, "a"),
            // Drops to under half of 6.0: new session.
            record("2026-08-01T12:00:00Z", 0.5, 0, "a"),
            record("2026-08-01T13:00:00Z", 4.0, 0, "a"),
        ];
        let report = summarize(&records);
        assert_eq!(report.sessions, 2);
        assert_eq!(report.total_cost, 10.0);
    }

    #[test]
    fn tiny_costs_never_split_sessions() {
        // Running max stays under the floor, so drops are noise.
        let records = vec![
            record("2026-08-01T10:00:00Z", 0.08, 0, "a"),
            record("2026-08-01T10:01:00Z", 0.01, 0, "a"),
            record("2026-08-01T10:02:00Z", 0.09, 0, "a"),
        ];
        assert_eq!(summarize(&records).sessions, 1);
    }

    #[test]
    fn days_are_grouped_and_capped_at_seven() {
        let mut records = Vec::new();
        for day in 1..=9 {
            records.push(record(
                &format!("2026-08-{day:02}T10:00:00Z"),
                day as f64,
                day as u64 * 1000,
                "proj",
            ));
        }
        let report = summarize(&records);
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.days.first().unwrap().date, "2026-08-03");
        assert_eq!(report.days.last().unwrap().date, "2026-08-09");
    }

    #[test]
    fn day_summary_takes_maxima_and_distinct_projects() {
        let records = vec![
            record("2026-08-01T10:00:00Z", 2.0, 5000, "beta"),
            record("2026-08-01T11:00:00Z", 5.0, 9000, "alpha"),
            record("2026-08-01T12:00:00Z", 3.0, 1000, "beta"),
        ];
        let report = summarize(&records);
        let day = &report.days[0];
        assert_eq!(day.max_cost, 5.0);
        assert_eq!(day.max_tokens, 9000);
        assert_eq!(day.projects, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn load_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"ts":"2026-08-01T10:00:00Z","m":"opus","c":1.0,"t":100,"d":0,"p":"a"}"#,
                "\n",
                "garbage line\n",
                r#"{"ts":"2026-08-01T10:02:00Z","m":"opus","c":2.0,"t":200,"d":0,"p":"a"}"#,
                "\n",
            ),
        )
        .unwrap();
        assert_eq!(load_records(&path).len(), 2);
    }
}
