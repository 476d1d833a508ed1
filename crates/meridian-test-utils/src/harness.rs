// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`Agent`] over mock gateways, mock
//! data tools and an in-memory session store. Provides `ask()` to drive the
//! full pipeline (routing -> orchestration -> normalization -> session).

use std::sync::Arc;

use meridian_agent::{Agent, Gateways, InMemorySessionStore};
use meridian_config::MeridianConfig;
use meridian_core::{
    AnswerRequest, AnswerResponse, GatewayResponse, MeridianError, ModelGateway, Tier,
};
use meridian_cost::{TierRates, UsageTracker};

use crate::mock_gateway::MockGateway;
use crate::mock_tools::MockToolProvider;

type Script = Vec<Result<GatewayResponse, MeridianError>>;

/// Session key used by [`TestHarness::ask`].
pub const TEST_SESSION: &str = "test-session";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    standard: Script,
    premium: Script,
    fallback: Option<Script>,
    tools: MockToolProvider,
    config: MeridianConfig,
    system_prompt: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = MeridianConfig::default();
        // Keep backoff waits negligible in tests.
        config.retry.base_delay_ms = 1;
        Self {
            standard: Vec::new(),
            premium: Vec::new(),
            fallback: None,
            tools: MockToolProvider::new(),
            config,
            system_prompt: "You are a test economist.".to_string(),
        }
    }

    /// Scripted results for the Standard gateway.
    pub fn with_standard(mut self, script: Script) -> Self {
        self.standard = script;
        self
    }

    /// Scripted results for the Premium gateway.
    pub fn with_premium(mut self, script: Script) -> Self {
        self.premium = script;
        self
    }

    /// Enable a fallback gateway with the given script.
    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    pub fn with_tools(mut self, tools: MockToolProvider) -> Self {
        self.tools = tools;
        self
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: MeridianConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.config.orchestration.max_iterations = max_iterations;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Build the harness and its agent.
    pub fn build(self) -> TestHarness {
        let standard = Arc::new(MockGateway::with_script(
            &self.config.routing.standard.model,
            self.standard,
        ));
        let premium = Arc::new(MockGateway::with_script(
            &self.config.routing.premium.model,
            self.premium,
        ));
        let fallback = self.fallback.map(|script| {
            Arc::new(MockGateway::with_script(
                &self.config.routing.fallback.model,
                script,
            ))
        });

        let tools = Arc::new(self.tools);
        let sessions = Arc::new(InMemorySessionStore::new());
        let usage = Arc::new(UsageTracker::new(TierRates::from_config(
            &self.config.routing,
            &self.config.pricing,
        )));

        let gateways = Gateways {
            standard: standard.clone(),
            premium: premium.clone(),
            fallback: fallback
                .clone()
                .map(|gateway| gateway as Arc<dyn ModelGateway>),
        };
        let agent = Agent::new(
            &self.config,
            gateways,
            tools.clone(),
            sessions.clone(),
            usage.clone(),
            self.system_prompt,
        );

        TestHarness {
            agent,
            standard,
            premium,
            fallback,
            tools,
            sessions,
            usage,
            config: self.config,
        }
    }
}

/// A complete test environment with mock adapters.
pub struct TestHarness {
    pub agent: Agent,
    pub standard: Arc<MockGateway>,
    pub premium: Arc<MockGateway>,
    pub fallback: Option<Arc<MockGateway>>,
    pub tools: Arc<MockToolProvider>,
    pub sessions: Arc<InMemorySessionStore>,
    pub usage: Arc<UsageTracker>,
    pub config: MeridianConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Ask a query in [`TEST_SESSION`] with classification and tools on.
    pub async fn ask(&self, query: &str) -> Result<AnswerResponse, MeridianError> {
        self.agent
            .answer(AnswerRequest::new(query, TEST_SESSION))
            .await
    }

    /// Ask a query on a fixed tier.
    pub async fn ask_on(&self, tier: Tier, query: &str) -> Result<AnswerResponse, MeridianError> {
        let mut request = AnswerRequest::new(query, TEST_SESSION);
        request.tier_override = Some(tier);
        self.agent.answer(request).await
    }

    /// Total gateway calls across every mock.
    pub async fn total_model_calls(&self) -> usize {
        let fallback = match &self.fallback {
            Some(gateway) => gateway.call_count().await,
            None => 0,
        };
        self.standard.call_count().await + self.premium.call_count().await + fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::SessionStore;

    #[tokio::test]
    async fn harness_answers_with_default_mock() {
        let harness = TestHarness::builder().build();
        let response = harness.ask("Chad population").await.unwrap();
        assert_eq!(response.answer_text, "mock answer");
        assert_eq!(response.tier_used, Tier::Standard);
        assert_eq!(harness.total_model_calls().await, 1);

        let key = meridian_core::SessionKey::from(TEST_SESSION);
        let conversation = harness.sessions.get(&key).await.unwrap().unwrap();
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn ask_on_premium_uses_both_gateways() {
        let harness = TestHarness::builder()
            .with_premium(vec![Ok(GatewayResponse::text("Premium."))])
            .build();
        let response = harness.ask_on(Tier::Premium, "hi").await.unwrap();
        assert_eq!(response.answer_text, "Premium.");
        assert_eq!(harness.standard.call_count().await, 1);
        assert_eq!(harness.premium.call_count().await, 1);
    }
}
