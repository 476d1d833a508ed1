// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Built-in rates, USD per million tokens:
//!
//! Claude Haiku:   input=$0.80, output=$4.00
//! Claude Sonnet:  input=$3.00, output=$15.00
//! Claude Opus:    input=$15.00, output=$75.00
//! GPT-4o mini:    input=$0.15, output=$0.60
//! GPT-4o:         input=$2.50, output=$10.00

use meridian_config::model::{PricingConfig, RateConfig, RoutingConfig};
use meridian_core::TokenUsage;

use crate::usage::CostBucket;

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl From<RateConfig> for ModelPricing {
    fn from(rates: RateConfig) -> Self {
        Self {
            input_per_mtok: rates.input_per_mtok,
            output_per_mtok: rates.output_per_mtok,
        }
    }
}

/// Look up pricing for a model identifier by substring.
///
/// Unknown models fall back to Sonnet pricing so usage is never recorded
/// at zero cost.
pub fn get_pricing(model: &str) -> ModelPricing {
    let lower = model.to_lowercase();

    let (input_per_mtok, output_per_mtok) = if lower.contains("opus") {
        (15.0, 75.0)
    } else if lower.contains("haiku") {
        (0.80, 4.0)
    } else if lower.contains("gpt-4o-mini") {
        (0.15, 0.60)
    } else if lower.contains("gpt-4o") {
        (2.50, 10.0)
    } else {
        (3.0, 15.0)
    };

    ModelPricing {
        input_per_mtok,
        output_per_mtok,
    }
}

/// Cost in USD for the given token usage.
pub fn calculate_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    let input = (usage.input_tokens as f64 / 1_000_000.0) * pricing.input_per_mtok;
    let output = (usage.output_tokens as f64 / 1_000_000.0) * pricing.output_per_mtok;
    input + output
}

/// Fixed per-token rates for each cost bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierRates {
    pub standard: ModelPricing,
    pub premium: ModelPricing,
    pub fallback: ModelPricing,
}

impl TierRates {
    /// Rates from explicit `[pricing.*]` overrides, else from each slot's model.
    pub fn from_config(routing: &RoutingConfig, pricing: &PricingConfig) -> Self {
        let pick = |explicit: Option<RateConfig>, model: &str| {
            explicit
                .map(ModelPricing::from)
                .unwrap_or_else(|| get_pricing(model))
        };
        Self {
            standard: pick(pricing.standard, &routing.standard.model),
            premium: pick(pricing.premium, &routing.premium.model),
            fallback: pick(pricing.fallback, &routing.fallback.model),
        }
    }

    pub fn for_bucket(&self, bucket: CostBucket) -> &ModelPricing {
        match bucket {
            CostBucket::Standard => &self.standard,
            CostBucket::Premium => &self.premium,
            CostBucket::Fallback => &self.fallback,
        }
    }
}

impl Default for TierRates {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default(), &PricingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_family_pricing() {
        let p = get_pricing("claude-opus-4-1-20250805");
        assert!((p.input_per_mtok - 15.0).abs() < f64::EPSILON);
        assert!((p.output_per_mtok - 75.0).abs() < f64::EPSILON);

        let p = get_pricing("claude-haiku-4-5-20251001");
        assert!((p.input_per_mtok - 0.80).abs() < f64::EPSILON);

        let p = get_pricing("gpt-4o-mini");
        assert!((p.output_per_mtok - 0.60).abs() < f64::EPSILON);

        let p = get_pricing("gpt-4o-2024-08-06");
        assert!((p.input_per_mtok - 2.50).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_model_falls_back_to_sonnet() {
        let p = get_pricing("mystery-model");
        assert!((p.input_per_mtok - 3.0).abs() < f64::EPSILON);
        assert!((p.output_per_mtok - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn calculate_cost_input_and_output() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
        };
        let cost = calculate_cost(&usage, &get_pricing("claude-sonnet-4-20250514"));
        // 1000/1M * 3.0 + 500/1M * 15.0
        assert!((cost - (0.003 + 0.0075)).abs() < 1e-12);
    }

    #[test]
    fn explicit_rates_override_model_table() {
        let pricing = PricingConfig {
            premium: Some(RateConfig {
                input_per_mtok: 1.0,
                output_per_mtok: 2.0,
            }),
            ..PricingConfig::default()
        };
        let rates = TierRates::from_config(&RoutingConfig::default(), &pricing);
        assert_eq!(rates.premium.input_per_mtok, 1.0);
        assert_eq!(rates.standard, get_pricing("claude-haiku-4-5-20251001"));
        assert_eq!(rates.fallback, get_pricing("claude-sonnet-4-20250514"));
    }
}
