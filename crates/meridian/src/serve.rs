// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service assembly shared by `meridian serve` and `meridian ask`.

use std::sync::Arc;
use std::time::Duration;

use meridian_agent::{load_system_prompt, Agent, Gateways, InMemorySessionStore};
use meridian_config::{MeridianConfig, ModelSlot};
use meridian_core::{DataToolProvider, MeridianError, ModelGateway};
use meridian_cost::{TierRates, UsageTracker};
use tracing::{info, warn};

use crate::shutdown;

/// Instantiates the gateway for one routing slot by provider name.
fn build_gateway(
    config: &MeridianConfig,
    slot: &ModelSlot,
) -> Result<Arc<dyn ModelGateway>, MeridianError> {
    match slot.provider.as_str() {
        #[cfg(feature = "anthropic")]
        "anthropic" => Ok(Arc::new(meridian_anthropic::AnthropicGateway::new(
            &config.anthropic,
            slot,
        )?)),
        #[cfg(feature = "openai")]
        "openai" => Ok(Arc::new(meridian_openai::OpenAiGateway::new(
            &config.openai,
            slot,
        )?)),
        other => Err(MeridianError::AdapterNotFound {
            adapter_type: "provider".to_string(),
            name: other.to_string(),
        }),
    }
}

/// Builds the agent and all of its collaborators from configuration.
///
/// Standard and Premium gateways are required. A fallback gateway that
/// fails to initialize is logged and skipped.
pub async fn build_agent(config: &MeridianConfig) -> Result<Agent, MeridianError> {
    let standard = build_gateway(config, &config.routing.standard)?;
    let premium = build_gateway(config, &config.routing.premium)?;

    let fallback = if config.routing.fallback_enabled {
        match build_gateway(config, &config.routing.fallback) {
            Ok(gateway) => Some(gateway),
            Err(e) => {
                warn!(
                    provider = %config.routing.fallback.provider,
                    model = %config.routing.fallback.model,
                    error = %e,
                    "fallback gateway unavailable, continuing without it"
                );
                None
            }
        }
    } else {
        None
    };

    let registry = meridian_tools::build_registry(
        &config.tools,
        Duration::from_secs(config.orchestration.tool_timeout_secs),
    )?;
    info!(tools = registry.len(), "tool registry initialized");
    let tools: Arc<dyn DataToolProvider> = Arc::new(registry);

    let usage = Arc::new(UsageTracker::new(TierRates::from_config(
        &config.routing,
        &config.pricing,
    )));
    let system_prompt = load_system_prompt(&config.agent).await;

    info!(
        standard = %standard.model(),
        premium = %premium.model(),
        fallback = fallback.is_some(),
        "model gateways initialized"
    );

    Ok(Agent::new(
        config,
        Gateways {
            standard,
            premium,
            fallback,
        },
        tools,
        Arc::new(InMemorySessionStore::new()),
        usage,
        system_prompt,
    ))
}

/// Runs the `meridian serve` command until SIGINT or SIGTERM.
pub async fn run_serve(config: MeridianConfig) -> Result<(), MeridianError> {
    info!("starting meridian serve");

    meridian_gateway::ensure_bind_allowed(&config.gateway)?;
    let agent = Arc::new(build_agent(&config).await?);

    let cancel = shutdown::install_signal_handler();
    meridian_gateway::serve(&config.gateway, agent, cancel.cancelled_owned()).await?;

    info!("meridian serve exited");
    Ok(())
}
