// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: known provider names,
//! positive loop bounds, non-negative rates, parseable addresses.

use std::str::FromStr;

use meridian_core::Tier;

use crate::diagnostic::ConfigError;
use crate::model::{MeridianConfig, ModelSlot, RateConfig};

/// Providers a model slot may name.
pub const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on the configurable iteration cap.
const MAX_ITERATIONS_LIMIT: u32 = 50;

/// Validate a deserialized configuration.
///
/// Collects every problem rather than failing fast.
pub fn validate_config(config: &MeridianConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.agent.log_level
        )));
    }

    validate_slot("routing.standard", &config.routing.standard, &mut errors);
    validate_slot("routing.premium", &config.routing.premium, &mut errors);
    if config.routing.fallback_enabled {
        validate_slot("routing.fallback", &config.routing.fallback, &mut errors);
    }

    if let Some(forced) = &config.routing.force_tier
        && Tier::from_str(forced).is_err()
    {
        errors.push(ConfigError::validation(format!(
            "routing.force_tier must be `standard` or `premium`, got `{forced}`"
        )));
    }

    let iterations = config.orchestration.max_iterations;
    if iterations == 0 || iterations > MAX_ITERATIONS_LIMIT {
        errors.push(ConfigError::validation(format!(
            "orchestration.max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT}, got {iterations}"
        )));
    }
    if config.orchestration.tool_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "orchestration.tool_timeout_secs must be greater than 0",
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "retry.max_attempts must be at least 1",
        ));
    }
    if config.retry.base_delay_ms > 60_000 {
        errors.push(ConfigError::validation(format!(
            "retry.base_delay_ms must be at most 60000, got {}",
            config.retry.base_delay_ms
        )));
    }

    for (name, rates) in [
        ("pricing.standard", &config.pricing.standard),
        ("pricing.premium", &config.pricing.premium),
        ("pricing.fallback", &config.pricing.fallback),
    ] {
        if let Some(rates) = rates {
            validate_rates(name, rates, &mut errors);
        }
    }

    if let Some(endpoint) = &config.tools.endpoint
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "tools.endpoint must be an http(s) URL, got `{endpoint}`"
        )));
    }

    let host = config.gateway.host.trim();
    let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
    let is_valid_hostname = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
    if !is_valid_ip && !is_valid_hostname {
        errors.push(ConfigError::validation(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_slot(name: &str, slot: &ModelSlot, errors: &mut Vec<ConfigError>) {
    if !KNOWN_PROVIDERS.contains(&slot.provider.as_str()) {
        errors.push(ConfigError::validation(format!(
            "{name}.provider must be one of {}, got `{}`",
            KNOWN_PROVIDERS.join(", "),
            slot.provider
        )));
    }
    if slot.model.trim().is_empty() {
        errors.push(ConfigError::validation(format!(
            "{name}.model must not be empty"
        )));
    }
    if slot.max_tokens == 0 {
        errors.push(ConfigError::validation(format!(
            "{name}.max_tokens must be greater than 0"
        )));
    }
}

fn validate_rates(name: &str, rates: &RateConfig, errors: &mut Vec<ConfigError>) {
    if rates.input_per_mtok < 0.0 || rates.output_per_mtok < 0.0 {
        errors.push(ConfigError::validation(format!(
            "{name} rates must be non-negative"
        )));
    }
}
