//! Model pricing: dynamic LiteLLM table with a static per-family fallback.

use serde_json::Value;

use crate::snapshot::ModelFamily;

/// Per-model rates in dollars per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

impl ModelPricing {
    /// Hardcoded rates used when the pricing cache is unavailable.
    pub fn fallback(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Opus => Self {
                input: 5.0,
                output: 25.0,
                cache_write: 6.25,
                cache_read: 0.50,
            },
            ModelFamily::Sonnet => Self {
                input: 3.0,
                output: 15.0,
                cache_write: 3.75,
                cache_read: 0.30,
            },
            ModelFamily::Haiku => Self {
                input: 1.0,
                output: 5.0,
                cache_write: 1.25,
                cache_read: 0.10,
            },
        }
    }

    /// Resolve rates for `model_id` from the cached pricing table.
    ///
    /// Tries the exact id, then the `provider/model` spelling LiteLLM often
    /// uses; anything missing falls back to the family table. Rates in the
    /// table are per token and scale to per-MTok here.
    pub fn resolve(pricing: Option<&Value>, model_id: &str) -> Self {
        let fallback = Self::fallback(ModelFamily::detect(model_id));
        let Some(table) = pricing.and_then(Value::as_object) else {
            return fallback;
        };

        let entry = table
            .get(model_id)
            .or_else(|| table.get(&model_id.replace('-', "/")));
        let Some(entry) = entry else {
            return fallback;
        };

        let per_mtok = |field: &str| {
            entry
                .get(field)
                .and_then(Value::as_f64)
                .map(|v| v * 1_000_000.0)
        };

        Self {
            input: per_mtok("input_cost_per_token").unwrap_or(fallback.input),
            output: per_mtok("output_cost_per_token").unwrap_or(fallback.output),
            cache_write: per_mtok("cache_creation_input_token_cost")
                .unwrap_or(fallback.cache_write),
            cache_read: per_mtok("cache_read_input_token_cost").unwrap_or(fallback.cache_read),
        }
    }

    /// Rough session cost from cumulative input/output token counts.
    pub fn estimate(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input + output_tokens as f64 * self.output) / 1_000_000.0
    }
}
