// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handling for the Meridian assistant.
//!
//! [`Agent::answer`] routes a query to a tier, runs the tool-orchestration
//! loop against the session's conversation, normalizes the collected tool
//! outcomes into charts, and records the exchange in the session store.

pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod session;

use std::sync::Arc;

use meridian_config::MeridianConfig;
use futures::future::join_all;
use meridian_core::{
    AnswerRequest, AnswerResponse, DataToolProvider, GatewayHealth, HealthStatus, MeridianError,
    Message, ModelGateway, PluginAdapter, SessionKey, SessionStore,
};
use meridian_cost::{UsageCounters, UsageTracker};
use meridian_router::TierRouter;
use tokio::time::Instant;
use tracing::info;

pub use orchestrator::{LoopResult, LoopState, Orchestrator, OrchestratorSettings};
pub use prompt::load_system_prompt;
pub use retry::{CallOutcome, RetryPolicy};
pub use session::InMemorySessionStore;

/// The model gateways serving each tier.
#[derive(Clone)]
pub struct Gateways {
    pub standard: Arc<dyn ModelGateway>,
    pub premium: Arc<dyn ModelGateway>,
    /// Used once when the Standard tool phase fails.
    pub fallback: Option<Arc<dyn ModelGateway>>,
}

/// Answers queries and owns the per-process session and usage state.
pub struct Agent {
    router: TierRouter,
    gateways: Vec<(&'static str, Arc<dyn ModelGateway>)>,
    orchestrator: Orchestrator,
    sessions: Arc<dyn SessionStore>,
    usage: Arc<UsageTracker>,
}

impl Agent {
    /// Assemble an agent. The fallback gateway is dropped when
    /// `routing.fallback_enabled` is off.
    pub fn new(
        config: &MeridianConfig,
        gateways: Gateways,
        tools: Arc<dyn DataToolProvider>,
        sessions: Arc<dyn SessionStore>,
        usage: Arc<UsageTracker>,
        system_prompt: String,
    ) -> Self {
        let fallback = gateways
            .fallback
            .filter(|_| config.routing.fallback_enabled);
        let mut roles: Vec<(&'static str, Arc<dyn ModelGateway>)> = vec![
            ("standard", gateways.standard.clone()),
            ("premium", gateways.premium.clone()),
        ];
        if let Some(fallback) = &fallback {
            roles.push(("fallback", fallback.clone()));
        }
        let orchestrator = Orchestrator::new(
            gateways.standard,
            gateways.premium,
            fallback,
            tools,
            usage.clone(),
        )
        .with_retry(RetryPolicy::from_config(&config.retry))
        .with_settings(OrchestratorSettings::from_config(&config.orchestration))
        .with_system_prompt(system_prompt);

        Self {
            router: TierRouter::new(&config.routing),
            gateways: roles,
            orchestrator,
            sessions,
            usage,
        }
    }

    /// Answer one query in the context of its session.
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse, MeridianError> {
        let started = Instant::now();
        let decision = self.router.route(&request.query, request.tier_override);
        info!(
            session = %request.session_key,
            tier = %decision.tier,
            source = ?decision.source,
            score = ?decision.score,
            reason = %decision.reason,
            "query routed"
        );

        let key = SessionKey(request.session_key);
        let mut conversation = self.sessions.get(&key).await?.unwrap_or_default();

        let result = self
            .orchestrator
            .run(
                decision.tier,
                conversation.to_messages(),
                &decision.query,
                request.tools_enabled,
            )
            .await?;

        let charts = meridian_charts::normalize(&result.outcomes, &decision.query);

        conversation.push(Message::user(&decision.query));
        conversation.push(Message::assistant(&result.text));
        self.sessions.put(&key, conversation).await?;

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            session = %key,
            tier_used = %result.tier_used,
            model = %result.model,
            iterations = result.iterations,
            model_calls = result.model_calls,
            tools = result.tools_used.len(),
            charts = charts.len(),
            cost_usd = result.cost_usd,
            fallback = result.fallback_used,
            degraded = result.degraded,
            latency_ms,
            "answer complete"
        );

        Ok(AnswerResponse {
            answer_text: result.text,
            tools_used: result.tools_used,
            charts,
            tier_used: result.tier_used,
            model: result.model,
            estimated_cost_usd: result.cost_usd,
            latency_ms,
        })
    }

    /// Forget a session's conversation. Idempotent.
    pub async fn reset_session(&self, session_key: &str) -> Result<(), MeridianError> {
        let key = SessionKey::from(session_key);
        self.sessions.delete(&key).await?;
        info!(session = %key, "session reset");
        Ok(())
    }

    pub fn usage_snapshot(&self) -> UsageCounters {
        self.usage.snapshot()
    }

    pub fn reset_usage(&self) {
        self.usage.reset();
    }

    /// Health of every configured gateway, in standard, premium, fallback
    /// order. A failing check is reported as unhealthy.
    pub async fn gateway_health(&self) -> Vec<GatewayHealth> {
        join_all(self.gateways.iter().map(|(role, gateway)| async move {
            let status = gateway
                .health_check()
                .await
                .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
            GatewayHealth {
                role: (*role).to_string(),
                adapter: gateway.name().to_string(),
                version: gateway.version().to_string(),
                model: gateway.model().to_string(),
                status,
            }
        }))
        .await
    }
}
