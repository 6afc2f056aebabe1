//! Line 1: model name, context-window pressure, session cost and duration.

use ccline_core::config::Settings;
use ccline_core::pricing::ModelPricing;
use ccline_core::snapshot::{ModelFamily, Snapshot};
use serde_json::Value;

use super::format::{abbrev_duration, abbrev_tokens, bar, dim, osc8, paint_cost, paint_pct};
use super::Tier;

const CONSOLE_USAGE_URL: &str = "https://console.anthropic.com/settings/usage";

/// Build line 1.
///
/// The model name is colorized by that family's weekly limit pressure
/// (model-specific sub-limit preferred, aggregate weekly limit otherwise),
/// never by context pressure; the context bar already shows that.
pub fn context_line(
    snapshot: &Snapshot,
    tier: Tier,
    limits: Option<&Value>,
    pricing: Option<&Value>,
    settings: &Settings,
) -> String {
    let family = ModelFamily::detect(&snapshot.model.id);

    let usage = snapshot.current_usage();
    let used =
        usage.input_tokens + usage.cache_creation_input_tokens + usage.cache_read_input_tokens;
    let window = snapshot.context_window.context_window_size;
    let buffer = settings.cache.buffer_200k * window / 200_000;
    let effective = (window.saturating_sub(buffer)).max(1);
    let pct = (used * 100 / effective).min(100);
    let remaining = effective.saturating_sub(used);

    let model_display = match limits {
        Some(lim) => {
            let utilization = lim
                .pointer(&format!("/seven_day_{}/utilization", family.key()))
                .and_then(Value::as_f64)
                .or_else(|| {
                    lim.pointer("/seven_day/utilization")
                        .and_then(Value::as_f64)
                })
                .unwrap_or(0.0);
            paint_pct(utilization as u64, family.label())
        }
        None => family.label().to_string(),
    };

    let cost_link = osc8(CONSOLE_USAGE_URL, &cost_text(snapshot, pricing, settings));
    let remaining_text = abbrev_tokens(remaining as i64);

    let duration_ms = snapshot.total_duration_ms();
    let duration = if duration_ms > 60_000 {
        format!(" {}", dim(&abbrev_duration(duration_ms)))
    } else {
        String::new()
    };

    match tier.bar_width() {
        None => format!("{model_display} {remaining_text}▼ ses:{cost_link}"),
        Some(width) => {
            let symbols = &settings.symbols.ctx;
            let ctx_bar = paint_pct(pct, &bar(pct, &symbols[0], &symbols[1], width));
            format!("{model_display} {ctx_bar} {remaining_text}▼ | ses: {cost_link}{duration}")
        }
    }
}

/// Session cost figure, colorized by the warn/crit thresholds.
///
/// When the feed omits the cost but token totals exist, estimate from the
/// pricing cache and mark the figure approximate.
fn cost_text(snapshot: &Snapshot, pricing: Option<&Value>, settings: &Settings) -> String {
    let (cost, text) = match snapshot.cost.total_cost_usd {
        Some(cost) => (cost, format!("${cost:.2}")),
        None if snapshot.total_tokens() > 0 => {
            let rates = ModelPricing::resolve(pricing, &snapshot.model.id);
            let estimate = rates.estimate(
                snapshot.context_window.total_input_tokens,
                snapshot.context_window.total_output_tokens,
            );
            (estimate, format!("~${estimate:.2}"))
        }
        None => (0.0, "$0.00".to_string()),
    };
    paint_cost(
        cost,
        settings.thresholds.cost_warn,
        settings.thresholds.cost_crit,
        &text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::format::{BLINK, GREEN, RED};
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::from_reader(
            r#"{
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
                "cost": {"total_cost_usd": 3.5, "total_duration_ms": 1200000}
            }"#
            .as_bytes(),
        )
        .unwrap()
    }

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn remaining_tokens_after_buffer() {
        // effective = 200000 - 33000 = 167000; used = 75000; remaining = 92000
        let line = context_line(&snapshot(), Tier::Compact, None, None, &settings());
        assert!(line.contains("92k▼"), "line: {line}");
    }

    #[test]
    fn model_label_from_family() {
        let line = context_line(&snapshot(), Tier::Full, None, None, &settings());
        assert!(line.contains("Opus 4.6"));
    }

    #[test]
    fn ultra_has_no_bar() {
        let line = context_line(&snapshot(), Tier::Ultra, None, None, &settings());
        assert!(!line.contains('◆'));
        assert!(!line.contains('◇'));
        assert!(line.contains("▼"));
        assert!(line.contains("ses:"));
    }

    #[test]
    fn compact_has_a_six_unit_bar() {
        let line = context_line(&snapshot(), Tier::Compact, None, None, &settings());
        let units = line.chars().filter(|c| *c == '◆' || *c == '◇').count();
        assert_eq!(units, 6);
    }

    #[test]
    fn duration_rendered_beyond_a_minute() {
        let line = context_line(&snapshot(), Tier::Compact, None, None, &settings());
        assert!(line.contains("20m"));
    }

    #[test]
    fn model_color_follows_sub_limit() {
        let limits = json!({
            "seven_day": {"utilization": 50},
            "seven_day_opus": {"utilization": 85}
        });
        let line = context_line(&snapshot(), Tier::Full, Some(&limits), None, &settings());
        assert!(line.contains(RED));
        assert!(!line.contains(BLINK));
    }

    #[test]
    fn model_blinks_at_ninety_percent() {
        let limits = json!({"seven_day_opus": {"utilization": 95}});
        let line = context_line(&snapshot(), Tier::Full, Some(&limits), None, &settings());
        assert!(line.contains(BLINK));
    }

    #[test]
    fn model_stays_green_when_limits_are_comfortable() {
        let limits = json!({"seven_day": {"utilization": 45}});
        let line = context_line(&snapshot(), Tier::Full, Some(&limits), None, &settings());
        assert!(line.contains(&format!("{GREEN}Opus 4.6")));
    }

    #[test]
    fn missing_cost_is_estimated_from_pricing() {
        let mut snap = snapshot();
        snap.cost.total_cost_usd = None;
        let line = context_line(&snap, Tier::Full, None, None, &settings());
        // 100k in + 30k out at opus fallback rates: 0.5 + 0.75 = 1.25
        assert!(line.contains("~$1.25"), "line: {line}");
    }

    #[test]
    fn cost_is_hyperlinked() {
        let line = context_line(&snapshot(), Tier::Full, None, None, &settings());
        assert!(line.contains("\x1b]8;;https://console.anthropic.com"));
        assert!(line.contains("$3.50"));
    }

    #[test]
    fn small_nonzero_usage_still_shows_a_filled_unit() {
        let mut snap = snapshot();
        snap.context_window.current_usage = Some(ccline_core::snapshot::CurrentUsage {
            input_tokens: 2000,
            output_tokens: 0,
            cache_creation_input_tokens: 0,
            cache_read_input_tokens: 0,
        });
        let line = context_line(&snap, Tier::Compact, None, None, &settings());
        assert!(line.contains('◆'), "line: {line}");
    }
}
