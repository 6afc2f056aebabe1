//! Presentation of the session-log summary (the `stats` subcommand).

use anyhow::Result;
use ccline_core::cache::CacheStore;
use ccline_core::session::{load_records, summarize, LOG_FILE};

use crate::render::format::abbrev_tokens;

pub fn print_report(store: &CacheStore) -> Result<()> {
    let log_path = store.dir().join(LOG_FILE);
    if !log_path.exists() {
        println!("No session log.");
        return Ok(());
    }

    let records = load_records(&log_path);
    if records.is_empty() {
        println!("Log empty.");
        return Ok(());
    }

    let report = summarize(&records);
    println!(
        "Entries: {} | Sessions: ~{} | Total: ${:.0}",
        report.entries, report.sessions, report.total_cost
    );
    println!();

    for day in &report.days {
        println!(
            "  {}: ${:.0} | {} | prj: {}",
            day.date,
            day.max_cost,
            abbrev_tokens(day.max_tokens as i64),
            day.projects.join(", ")
        );
    }
    Ok(())
}
