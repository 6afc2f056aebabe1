//! Line 2: rate-limit meters, per-model weekly sub-limits, and spend.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use ccline_core::config::Settings;
use ccline_core::snapshot::ModelFamily;
use serde_json::Value;

use super::format::{bar, dim, paint_pct, pie_icon, sparkline};
use super::Tier;

/// Build line 2 from the cached limits and usage-accounting payloads.
///
/// `now` drives the reset countdown and `today` the spend aggregation
/// windows; both are passed in so rendering stays deterministic.
pub fn limits_line(
    tier: Tier,
    limits: Option<&Value>,
    usage: Option<&Value>,
    settings: &Settings,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> String {
    let mut line = limits_part(tier, limits, settings, now);
    line.push_str(&spend_part(tier, usage, today));
    line
}

fn limits_part(
    tier: Tier,
    limits: Option<&Value>,
    settings: &Settings,
    now: DateTime<Utc>,
) -> String {
    let Some(lim) = limits else {
        return "5h: — | wk: —".to_string();
    };

    let five_hour = utilization(lim, "/five_hour/utilization");
    let countdown = lim
        .pointer("/five_hour/resets_at")
        .and_then(Value::as_str)
        .and_then(parse_iso)
        .map(|resets_at| {
            let secs = (resets_at - now).num_seconds().max(0);
            format!(" {}:{:02}", secs / 3600, secs % 3600 / 60)
        })
        .unwrap_or_default();

    let weekly = utilization(lim, "/seven_day/utilization");
    let weekly_text = paint_pct(weekly, &format!("{weekly}%"));
    let subs = sub_limits(lim);

    match tier.bar_width() {
        None => {
            let five_text = paint_pct(five_hour, &format!("{five_hour}%"));
            format!("5h:{five_text}{countdown} wk:{weekly_text}{subs}")
        }
        Some(width) => {
            let symbols = &settings.symbols.lim;
            let five_bar = paint_pct(five_hour, &bar(five_hour, &symbols[0], &symbols[1], width));
            let pie = pie_icon(weekly, &settings.symbols.pie);
            format!("5h: {five_bar}{countdown} | wk: {pie} {weekly_text}{subs}")
        }
    }
}

/// The O/S/H weekly sub-limit trio; dim dashes for absent families.
fn sub_limits(lim: &Value) -> String {
    let mut out = String::new();
    for family in ModelFamily::ALL {
        let pointer = format!("/seven_day_{}/utilization", family.key());
        match lim.pointer(&pointer).and_then(Value::as_f64) {
            Some(util) => {
                let util = util.max(0.0) as u64;
                out.push(' ');
                out.push_str(&paint_pct(util, &format!("{}:{util}", family.tag())));
            }
            None => {
                out.push(' ');
                out.push_str(&dim(&format!("{}:—", family.tag())));
            }
        }
    }
    out
}

fn spend_part(tier: Tier, usage: Option<&Value>, today: NaiveDate) -> String {
    let entries = usage.map(daily_entries).unwrap_or_default();
    if entries.is_empty() {
        return match tier {
            Tier::Ultra => " 1d:— 7d:— 30d:—".to_string(),
            _ => " | 1d: — 7d: — 30d: —".to_string(),
        };
    }

    let date = |days_back: i64| {
        (today - Duration::days(days_back))
            .format("%Y-%m-%d")
            .to_string()
    };
    let today_s = date(0);

    let day_cost = agg_cost(&entries, &today_s, &today_s);
    let week_cost = agg_cost(&entries, &date(6), &today_s);
    let month_cost = agg_cost(&entries, &date(29), &today_s);

    match tier {
        Tier::Ultra => {
            format!(" 1d:${day_cost:.0} 7d:${week_cost:.0} 30d:${month_cost:.0}")
        }
        _ => {
            let daily: Vec<f64> = (0..7)
                .rev()
                .map(|i| {
                    let day = date(i);
                    entries
                        .iter()
                        .filter(|e| entry_date(e) == day)
                        .map(|e| entry_cost(e))
                        .sum()
                })
                .collect();
            let spark = if daily.iter().any(|c| *c > 0.0) {
                format!(" {}", dim(&sparkline(&daily)))
            } else {
                String::new()
            };
            format!(" | 1d: ${day_cost:.0} 7d: ${week_cost:.0} 30d: ${month_cost:.0}{spark}")
        }
    }
}

/// Flatten the usage-accounting payload into daily entries.
///
/// Accepts a bare list, `{daily: [...]}` / `{data: [...]}`, or the
/// per-instance `{projects: {name: [...]}}` shape.
fn daily_entries(raw: &Value) -> Vec<&Value> {
    if let Some(arr) = raw.as_array() {
        return arr.iter().collect();
    }
    if let Some(obj) = raw.as_object() {
        if let Some(projects) = obj.get("projects").and_then(Value::as_object) {
            return projects
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .collect();
        }
        for key in ["daily", "data"] {
            if let Some(arr) = obj.get(key).and_then(Value::as_array) {
                return arr.iter().collect();
            }
        }
    }
    Vec::new()
}

fn agg_cost(entries: &[&Value], from: &str, to: &str) -> f64 {
    entries
        .iter()
        .filter(|e| {
            let date = entry_date(e);
            from <= date && date <= to
        })
        .map(|e| entry_cost(e))
        .sum()
}

fn entry_cost(entry: &Value) -> f64 {
    entry
        .get("totalCost")
        .and_then(Value::as_f64)
        .or_else(|| entry.get("cost").and_then(Value::as_f64))
        .unwrap_or(0.0)
}

fn entry_date<'a>(entry: &'a Value) -> &'a str {
    entry.get("date").and_then(Value::as_str).unwrap_or("")
}

fn utilization(lim: &Value, pointer: &str) -> u64 {
    lim.pointer(pointer)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .max(0.0) as u64
}

/// Lenient ISO-8601 parse; empty and literal "null" read as absent.
fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() || raw == "null" {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
