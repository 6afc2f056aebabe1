//! Pure formatting helpers: ANSI painting, bars, sparklines, abbreviations.
//!
//! No I/O and no shared state: everything here is a total function of its
//! arguments so the rendering pipeline stays trivially testable.

/// ANSI SGR escapes
pub const RESET: &str = "\x1b[0m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const DIM: &str = "\x1b[2m";
pub const BLINK: &str = "\x1b[5m";

/// Sparkline block elements, lowest to highest.
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Colorize by percentage: green <60, yellow 60-79, red >=80, blink >=90.
pub fn paint_pct(pct: u64, text: &str) -> String {
    if pct >= 90 {
        format!("{BLINK}{RED}{text}{RESET}")
    } else if pct >= 80 {
        format!("{RED}{text}{RESET}")
    } else if pct >= 60 {
        format!("{YELLOW}{text}{RESET}")
    } else {
        format!("{GREEN}{text}{RESET}")
    }
}

/// Colorize a cost figure by the warn/crit thresholds.
pub fn paint_cost(cost: f64, warn: f64, crit: f64, text: &str) -> String {
    if cost >= crit {
        format!("{RED}{text}{RESET}")
    } else if cost >= warn {
        format!("{YELLOW}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Dim wrapper.
pub fn dim(text: &str) -> String {
    format!("{DIM}{text}{RESET}")
}

/// OSC 8 clickable hyperlink (iTerm2, Kitty, WezTerm).
pub fn osc8(url: &str, text: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}

/// Abbreviate a token count: 999, 128k, 1.9M, 21M.
///
/// Thousands floor to whole `k`; 1-10M keep one decimal with trailing
/// zero/point stripped (so 9 999 999 rounds up into "10M"); above that,
/// whole millions.
pub fn abbrev_tokens(tokens: i64) -> String {
    let t = tokens.max(0);
    if t >= 10_000_000 {
        format!("{}M", t / 1_000_000)
    } else if t >= 1_000_000 {
        let m = format!("{:.1}", t as f64 / 1_000_000.0);
        let m = m.trim_end_matches('0').trim_end_matches('.');
        format!("{m}M")
    } else if t >= 1000 {
        format!("{}k", t / 1000)
    } else {
        t.to_string()
    }
}

/// Fixed-width progress bar.
///
/// Fill count floors, but any nonzero percentage shows at least one filled
/// unit, since an all-empty bar would read as zero usage.
pub fn bar(pct: u64, filled: &str, empty: &str, width: usize) -> String {
    let pct = pct.min(100) as usize;
    let mut fill = pct * width / 100;
    if pct > 0 && fill == 0 {
        fill = 1;
    }
    format!("{}{}", filled.repeat(fill), empty.repeat(width - fill))
}

/// Five-bucket pie icon over closed ranges (0,20],(20,40],(40,60],(60,80],
/// (80,100]; zero maps to the emptiest glyph.
pub fn pie_icon(pct: u64, symbols: &[String; 5]) -> &str {
    let idx = match pct {
        0..=20 => 0,
        21..=40 => 1,
        41..=60 => 2,
        61..=80 => 3,
        _ => 4,
    };
    &symbols[idx]
}

/// Min-max normalized sparkline over 8 levels.
///
/// Empty and all-zero series render as empty output; a flat mid-level bar
/// would suggest activity that never happened.
pub fn sparkline(values: &[f64]) -> String {
    if values.is_empty() || values.iter().all(|v| *v == 0.0) {
        return String::new();
    }
    let mn = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mx = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = if mx > mn { mx - mn } else { 1.0 };
    values
        .iter()
        .map(|v| {
            let level = (((v - mn) / range) * 7.0) as usize;
            SPARK_LEVELS[level.min(7)]
        })
        .collect()
}

/// Abbreviate a millisecond duration: 2h14m or 14m.
pub fn abbrev_duration(ms: u64) -> String {
    let secs = ms / 1000;
    let hours = secs / 3600;
    let minutes = secs % 3600 / 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pie_symbols() -> [String; 5] {
        ["○", "◔", "◑", "◕", "●"].map(str::to_string)
    }

    #[test]
    fn token_abbreviation_boundaries() {
        assert_eq!(abbrev_tokens(0), "0");
        assert_eq!(abbrev_tokens(500), "500");
        assert_eq!(abbrev_tokens(999), "999");
        assert_eq!(abbrev_tokens(1000), "1k");
        assert_eq!(abbrev_tokens(128_000), "128k");
        assert_eq!(abbrev_tokens(999_999), "999k");
        assert_eq!(abbrev_tokens(1_000_000), "1M");
        assert_eq!(abbrev_tokens(1_900_000), "1.9M");
        assert_eq!(abbrev_tokens(2_500_000), "2.5M");
        assert_eq!(abbrev_tokens(9_999_999), "10M");
        assert_eq!(abbrev_tokens(10_000_000), "10M");
        assert_eq!(abbrev_tokens(21_000_000), "21M");
        assert_eq!(abbrev_tokens(115_000_000), "115M");
        assert_eq!(abbrev_tokens(-100), "0");
    }

    #[test]
    fn bar_fill_counts() {
        assert_eq!(bar(0, "█", "░", 5), "░░░░░");
        assert_eq!(bar(100, "█", "░", 5), "█████");
        assert_eq!(bar(50, "█", "░", 10), "█████░░░░░");
        assert_eq!(bar(60, "◆", "◇", 5), "◆◆◆◇◇");
    }

    #[test]
    fn bar_shows_at_least_one_unit_when_nonzero() {
        assert_eq!(bar(1, "█", "░", 10), "█░░░░░░░░░");
        assert_eq!(bar(9, "█", "░", 10), "█░░░░░░░░░");
    }

    #[test]
    fn bar_clamps_above_one_hundred() {
        assert_eq!(bar(150, "█", "░", 5), "█████");
    }

    #[test]
    fn pie_closed_range_buckets() {
        let syms = pie_symbols();
        assert_eq!(pie_icon(0, &syms), "○");
        assert_eq!(pie_icon(20, &syms), "○");
        assert_eq!(pie_icon(21, &syms), "◔");
        assert_eq!(pie_icon(40, &syms), "◔");
        assert_eq!(pie_icon(41, &syms), "◑");
        assert_eq!(pie_icon(60, &syms), "◑");
        assert_eq!(pie_icon(61, &syms), "◕");
        assert_eq!(pie_icon(80, &syms), "◕");
        assert_eq!(pie_icon(81, &syms), "●");
        assert_eq!(pie_icon(100, &syms), "●");
    }

    #[test]
    fn sparkline_empty_and_all_zero_render_nothing() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[0.0, 0.0, 0.0]), "");
    }

    #[test]
    fn sparkline_spans_lowest_to_highest() {
        let s: Vec<char> = sparkline(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .chars()
            .collect();
        assert_eq!(s.len(), 8);
        assert_eq!(*s.first().unwrap(), '▁');
        assert_eq!(*s.last().unwrap(), '█');
        // Strictly increasing input yields non-decreasing levels.
        assert!(s.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sparkline_two_values() {
        assert_eq!(sparkline(&[0.0, 100.0]), "▁█");
    }

    #[test]
    fn sparkline_flat_nonzero_is_all_lowest() {
        assert_eq!(sparkline(&[5.0, 5.0, 5.0]), "▁▁▁");
    }

    #[test]
    fn duration_abbreviation() {
        assert_eq!(abbrev_duration(0), "0m");
        assert_eq!(abbrev_duration(60_000), "1m");
        assert_eq!(abbrev_duration(300_000), "5m");
        assert_eq!(abbrev_duration(3_600_000), "1h00m");
        assert_eq!(abbrev_duration(8_040_000), "2h14m");
    }

    #[test]
    fn pct_painting_buckets() {
        assert!(paint_pct(30, "30%").contains(GREEN));
        assert!(paint_pct(65, "65%").contains(YELLOW));
        let red = paint_pct(85, "85%");
        assert!(red.contains(RED));
        assert!(!red.contains(BLINK));
        let blink = paint_pct(95, "95%");
        assert!(blink.contains(RED));
        assert!(blink.contains(BLINK));
    }

    #[test]
    fn cost_painting_thresholds() {
        assert_eq!(paint_cost(0.10, 0.5, 1.0, "$0.10"), "$0.10");
        assert!(paint_cost(0.50, 0.5, 1.0, "$0.50").contains(YELLOW));
        assert!(paint_cost(1.50, 0.5, 1.0, "$1.50").contains(RED));
    }

    #[test]
    fn osc8_wraps_text_in_a_hyperlink() {
        let link = osc8("https://example.com", "$1.00");
        assert!(link.starts_with("\x1b]8;;https://example.com\x1b\\"));
        assert!(link.contains("$1.00"));
        assert!(link.ends_with("\x1b]8;;\x1b\\"));
    }
}
