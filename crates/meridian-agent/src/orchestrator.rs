// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bounded tool-orchestration loop.
//!
//! One request walks [`LoopState`] from `AwaitingModel` to `Done`. Tool
//! calls within a turn run concurrently, each under its own timeout; every
//! outcome, success or failure, is fed back to the model as data. After
//! `max_iterations` tool-enabled calls the model gets one final call with
//! tools disabled and is asked to summarize.
//!
//! Tool work always runs on the Standard gateway. Premium requests hand the
//! collected outcomes and the Standard draft to the Premium gateway for one
//! tool-free analysis call, and degrade to the draft if that call fails.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use meridian_config::model::OrchestrationConfig;
use meridian_core::{
    ContentBlock, DataToolProvider, GatewayRequest, GatewayResponse, MeridianError, Message,
    ModelGateway, Role, Tier, ToolInvocation, ToolMode, ToolOutcome, ToolSchema,
};
use meridian_cost::{CostBucket, UsageTracker};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

/// Appended to the history when the iteration cap is reached.
const SUMMARIZE_PROMPT: &str = "You have reached the limit for data lookups. Using only the \
tool results above, write your final answer now. Do not request any more tools.";

const ANALYSIS_INSTRUCTIONS: &str = "Write the final answer to the question. Ground every \
figure in the tool data above, state the period and units, and point out gaps or \
inconsistencies between sources. Improve on the draft where the data allows.";

/// States of the orchestration loop.
#[derive(Debug)]
pub enum LoopState {
    /// Waiting for the next model response.
    AwaitingModel,
    /// The model asked for tools; the assistant turn is not yet in history.
    ToolsRequested(GatewayResponse),
    /// Tool calls are being dispatched.
    ExecutingTools(Vec<ToolInvocation>),
    /// Terminal: the final answer text.
    Done(String),
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::AwaitingModel => write!(f, "awaiting_model"),
            LoopState::ToolsRequested(_) => write!(f, "tools_requested"),
            LoopState::ExecutingTools(_) => write!(f, "executing_tools"),
            LoopState::Done(_) => write!(f, "done"),
        }
    }
}

/// Loop bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Tool-enabled model calls before the forced summary call.
    pub max_iterations: u32,
    pub tool_timeout: Duration,
    /// Per-outcome character cap in the Premium analysis prompt.
    pub premium_context_max_chars: usize,
}

impl OrchestratorSettings {
    pub fn from_config(config: &OrchestrationConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
            premium_context_max_chars: config.premium_context_max_chars,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&OrchestrationConfig::default())
    }
}

/// Everything one orchestrated request produced.
#[derive(Debug, Clone)]
pub struct LoopResult {
    pub text: String,
    /// Outcomes in execution order, for chart normalization.
    pub outcomes: Vec<ToolOutcome>,
    pub tools_used: BTreeSet<String>,
    /// Model that wrote `text`.
    pub model: String,
    pub tier_used: Tier,
    /// Tool-enabled model calls made by the tool phase.
    pub iterations: u32,
    /// Successful gateway calls across all phases.
    pub model_calls: u32,
    pub cost_usd: f64,
    pub fallback_used: bool,
    /// The Premium analysis failed and the Standard draft was returned.
    pub degraded: bool,
}

/// A gateway and the bucket its calls are billed to.
struct Lane<'a> {
    gateway: &'a Arc<dyn ModelGateway>,
    bucket: CostBucket,
}

/// Spend accumulated by one request.
#[derive(Debug, Default)]
struct Spend {
    model_calls: u32,
    cost_usd: f64,
}

/// Output of one tool phase on one lane.
struct ToolPhase {
    text: String,
    outcomes: Vec<ToolOutcome>,
    tools_used: BTreeSet<String>,
    model: String,
    iterations: u32,
}

/// Drives gateway calls and tool execution for single requests.
pub struct Orchestrator {
    standard: Arc<dyn ModelGateway>,
    premium: Arc<dyn ModelGateway>,
    fallback: Option<Arc<dyn ModelGateway>>,
    tools: Arc<dyn DataToolProvider>,
    usage: Arc<UsageTracker>,
    retry: RetryPolicy,
    settings: OrchestratorSettings,
    system_prompt: Option<String>,
}

impl Orchestrator {
    pub fn new(
        standard: Arc<dyn ModelGateway>,
        premium: Arc<dyn ModelGateway>,
        fallback: Option<Arc<dyn ModelGateway>>,
        tools: Arc<dyn DataToolProvider>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            standard,
            premium,
            fallback,
            tools,
            usage,
            retry: RetryPolicy::default(),
            settings: OrchestratorSettings::default(),
            system_prompt: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Answer `query` on `tier`, given the prior `conversation`.
    pub async fn run(
        &self,
        tier: Tier,
        conversation: Vec<Message>,
        query: &str,
        tools_enabled: bool,
    ) -> Result<LoopResult, MeridianError> {
        let mut spend = Spend::default();
        let mut history = conversation.clone();
        history.push(Message::user(query));

        if !tools_enabled {
            return self.run_without_tools(tier, history, &mut spend).await;
        }

        let (phase, fallback_used) = self.tool_phase(history, &mut spend).await?;

        if tier == Tier::Standard {
            return Ok(finish(phase, Tier::Standard, spend, fallback_used, false));
        }

        match self.analyze(conversation, query, &phase, &mut spend).await {
            Ok((text, model)) => {
                info!(
                    model = %model,
                    outcomes = phase.outcomes.len(),
                    "premium analysis complete"
                );
                let phase = ToolPhase {
                    text,
                    model,
                    ..phase
                };
                Ok(finish(phase, Tier::Premium, spend, fallback_used, false))
            }
            Err(e) => {
                warn!(error = %e, "premium analysis failed, returning standard answer");
                Ok(finish(phase, Tier::Standard, spend, fallback_used, true))
            }
        }
    }

    /// One tool-free call on the tier gateway. A failed Premium call
    /// degrades to a Standard call.
    async fn run_without_tools(
        &self,
        tier: Tier,
        history: Vec<Message>,
        spend: &mut Spend,
    ) -> Result<LoopResult, MeridianError> {
        let request = self.request(history, Vec::new(), ToolMode::Disabled);
        let standard = Lane {
            gateway: &self.standard,
            bucket: CostBucket::Standard,
        };

        let (response, tier_used, degraded) = match tier {
            Tier::Standard => (self.call(&standard, &request, spend).await?, tier, false),
            Tier::Premium => {
                let premium = Lane {
                    gateway: &self.premium,
                    bucket: CostBucket::Premium,
                };
                match self.call(&premium, &request, spend).await {
                    Ok(response) => (response, Tier::Premium, false),
                    Err(e) => {
                        warn!(error = %e, "premium call failed, degrading to standard");
                        (self.call(&standard, &request, spend).await?, Tier::Standard, true)
                    }
                }
            }
        };

        let gateway = match tier_used {
            Tier::Premium => &self.premium,
            Tier::Standard => &self.standard,
        };
        let model = response_model(&response, gateway);
        Ok(LoopResult {
            text: final_text(response.text, &[]),
            outcomes: Vec::new(),
            tools_used: BTreeSet::new(),
            model,
            tier_used,
            iterations: 0,
            model_calls: spend.model_calls,
            cost_usd: spend.cost_usd,
            fallback_used: false,
            degraded,
        })
    }

    /// The Standard tool loop, falling back once to the fallback gateway
    /// from the original history.
    async fn tool_phase(
        &self,
        history: Vec<Message>,
        spend: &mut Spend,
    ) -> Result<(ToolPhase, bool), MeridianError> {
        let standard = Lane {
            gateway: &self.standard,
            bucket: CostBucket::Standard,
        };
        let err = match self.tool_loop(&standard, history.clone(), spend).await {
            Ok(phase) => return Ok((phase, false)),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(err);
        };
        warn!(
            error = %err,
            fallback = fallback.model(),
            "standard tool phase failed, switching to fallback gateway"
        );
        let lane = Lane {
            gateway: fallback,
            bucket: CostBucket::Fallback,
        };
        let phase = self.tool_loop(&lane, history, spend).await?;
        Ok((phase, true))
    }

    async fn tool_loop(
        &self,
        lane: &Lane<'_>,
        mut history: Vec<Message>,
        spend: &mut Spend,
    ) -> Result<ToolPhase, MeridianError> {
        let schemas = self.tools.tool_schemas();
        let mut outcomes = Vec::new();
        let mut tools_used = BTreeSet::new();
        let mut model = lane.gateway.model().to_string();
        let mut iterations = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            debug!(state = %state, iterations, bucket = %lane.bucket, "loop step");
            state = match state {
                LoopState::AwaitingModel if iterations >= self.settings.max_iterations => {
                    warn!(
                        iterations,
                        bucket = %lane.bucket,
                        "iteration cap reached, requesting summary"
                    );
                    append_user_text(&mut history, SUMMARIZE_PROMPT);
                    let request = self.request(history.clone(), schemas.clone(), ToolMode::Disabled);
                    let response = self.call(lane, &request, spend).await?;
                    model = response_model(&response, lane.gateway);
                    if response.requests_tools() {
                        warn!(
                            requested = response.tool_invocations.len(),
                            bucket = %lane.bucket,
                            "summary call requested tools, ignoring them"
                        );
                    }
                    LoopState::Done(final_text(response.text, &outcomes))
                }
                LoopState::AwaitingModel => {
                    iterations += 1;
                    let request = self.request(history.clone(), schemas.clone(), ToolMode::Auto);
                    let response = self.call(lane, &request, spend).await?;
                    model = response_model(&response, lane.gateway);
                    if response.requests_tools() {
                        LoopState::ToolsRequested(response)
                    } else {
                        LoopState::Done(final_text(response.text, &outcomes))
                    }
                }
                LoopState::ToolsRequested(response) => {
                    history.push(assistant_turn(&response));
                    LoopState::ExecutingTools(response.tool_invocations)
                }
                LoopState::ExecutingTools(invocations) => {
                    let results = self.execute_tools(&invocations).await;
                    let blocks = invocations
                        .iter()
                        .zip(&results)
                        .map(|(invocation, outcome)| outcome.to_block(&invocation.id))
                        .collect();
                    history.push(Message {
                        role: Role::User,
                        content: blocks,
                    });
                    tools_used.extend(invocations.into_iter().map(|i| i.name));
                    outcomes.extend(results);
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => {
                    debug!(
                        iterations,
                        tools = tools_used.len(),
                        bucket = %lane.bucket,
                        "tool loop done"
                    );
                    return Ok(ToolPhase {
                        text,
                        outcomes,
                        tools_used,
                        model,
                        iterations,
                    });
                }
            };
        }
    }

    /// Run every invocation of one turn concurrently. Results keep
    /// invocation order.
    async fn execute_tools(&self, invocations: &[ToolInvocation]) -> Vec<ToolOutcome> {
        join_all(invocations.iter().map(|i| self.execute_tool(i))).await
    }

    async fn execute_tool(&self, invocation: &ToolInvocation) -> ToolOutcome {
        self.usage.tool_call_recorded();
        let name = invocation.name.as_str();
        let call = self.tools.execute(name, &invocation.arguments);

        match tokio::time::timeout(self.settings.tool_timeout, call).await {
            Ok(Ok(value)) => match error_field(&value) {
                Some(message) => {
                    warn!(tool = name, error = %message, "tool returned an error object");
                    ToolOutcome::failure(name, message)
                }
                None => {
                    debug!(tool = name, "tool succeeded");
                    ToolOutcome::success(name, value)
                }
            },
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "tool failed");
                let message = match e {
                    MeridianError::Tool { message, .. } => message,
                    other => other.to_string(),
                };
                ToolOutcome::failure(name, message)
            }
            Err(_) => {
                warn!(
                    tool = name,
                    timeout_secs = self.settings.tool_timeout.as_secs(),
                    "tool timed out"
                );
                ToolOutcome::failure(
                    name,
                    format!("timed out after {:?}", self.settings.tool_timeout),
                )
            }
        }
    }

    /// The single tool-free Premium call over the Standard phase's output.
    async fn analyze(
        &self,
        conversation: Vec<Message>,
        query: &str,
        phase: &ToolPhase,
        spend: &mut Spend,
    ) -> Result<(String, String), MeridianError> {
        let prompt = analysis_prompt(
            query,
            &phase.text,
            &phase.outcomes,
            self.settings.premium_context_max_chars,
        );
        let mut history = conversation;
        history.push(Message::user(prompt));

        let lane = Lane {
            gateway: &self.premium,
            bucket: CostBucket::Premium,
        };
        let request = self.request(history, Vec::new(), ToolMode::Disabled);
        let response = self.call(&lane, &request, spend).await?;
        let model = response_model(&response, &self.premium);
        match response.text.filter(|t| !t.trim().is_empty()) {
            Some(text) => Ok((text, model)),
            None => Err(MeridianError::provider("premium analysis returned no text")),
        }
    }

    /// One gateway call through the retry policy, billed to the lane's bucket.
    async fn call(
        &self,
        lane: &Lane<'_>,
        request: &GatewayRequest,
        spend: &mut Spend,
    ) -> Result<GatewayResponse, MeridianError> {
        let label = lane.bucket.to_string();
        let response = self
            .retry
            .run(&label, || lane.gateway.generate(request.clone()))
            .await?;

        let cost = self.usage.record_bucket(
            lane.bucket,
            response.usage.input_tokens,
            response.usage.output_tokens,
        );
        spend.model_calls += 1;
        spend.cost_usd += cost;
        Ok(response)
    }

    fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSchema>,
        tool_mode: ToolMode,
    ) -> GatewayRequest {
        GatewayRequest {
            system_prompt: self.system_prompt.clone(),
            messages,
            tools,
            tool_mode,
            max_tokens: 0,
        }
    }
}

fn finish(
    phase: ToolPhase,
    tier_used: Tier,
    spend: Spend,
    fallback_used: bool,
    degraded: bool,
) -> LoopResult {
    LoopResult {
        text: phase.text,
        outcomes: phase.outcomes,
        tools_used: phase.tools_used,
        model: phase.model,
        tier_used,
        iterations: phase.iterations,
        model_calls: spend.model_calls,
        cost_usd: spend.cost_usd,
        fallback_used,
        degraded,
    }
}

/// The model's answer, or a note on what was gathered when it is blank.
fn final_text(text: Option<String>, outcomes: &[ToolOutcome]) -> String {
    if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
        return text;
    }
    warn!(outcomes = outcomes.len(), "model returned no answer text");

    let mut gathered = BTreeSet::new();
    let mut failed = BTreeSet::new();
    for outcome in outcomes {
        if outcome.is_error() {
            failed.insert(outcome.tool.as_str());
        } else {
            gathered.insert(outcome.tool.as_str());
        }
    }

    let mut note = String::from("The model did not return a written answer.");
    if !gathered.is_empty() {
        let names: Vec<&str> = gathered.into_iter().collect();
        note.push_str(&format!(" Data gathered from: {}.", names.join(", ")));
    }
    if !failed.is_empty() {
        let names: Vec<&str> = failed.into_iter().collect();
        note.push_str(&format!(" Failed lookups: {}.", names.join(", ")));
    }
    if outcomes.is_empty() {
        note.push_str(" No data was gathered; please try rephrasing the question.");
    }
    note
}

/// The provider-reported model, or the gateway's configured one.
fn response_model(response: &GatewayResponse, gateway: &Arc<dyn ModelGateway>) -> String {
    if response.model.is_empty() {
        gateway.model().to_string()
    } else {
        response.model.clone()
    }
}

/// Assistant turn carrying any advisory text and the requested tool calls.
fn assistant_turn(response: &GatewayResponse) -> Message {
    let mut content = Vec::with_capacity(response.tool_invocations.len() + 1);
    if let Some(text) = response.text.as_ref().filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text { text: text.clone() });
    }
    content.extend(
        response
            .tool_invocations
            .iter()
            .map(|invocation| ContentBlock::ToolUse {
                id: invocation.id.clone(),
                name: invocation.name.clone(),
                input: invocation.arguments.clone(),
            }),
    );
    Message {
        role: Role::Assistant,
        content,
    }
}

/// Add text to the trailing user turn, or start one.
fn append_user_text(history: &mut Vec<Message>, text: &str) {
    let block = ContentBlock::Text {
        text: text.to_string(),
    };
    match history.last_mut() {
        Some(last) if last.role == Role::User => last.content.push(block),
        _ => history.push(Message {
            role: Role::User,
            content: vec![block],
        }),
    }
}

/// A result shaped `{"error": ...}` with a non-null error is a failure.
fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn analysis_prompt(query: &str, draft: &str, outcomes: &[ToolOutcome], max_chars: usize) -> String {
    let mut prompt = format!("Question: {query}\n\n");
    if outcomes.is_empty() {
        prompt.push_str("No tool data was gathered.\n\n");
    } else {
        prompt.push_str("Tool data:\n");
        for outcome in outcomes {
            let content = outcome.content();
            prompt.push_str(&format!(
                "[{}]\n{}\n\n",
                outcome.tool,
                truncate_chars(&content, max_chars)
            ));
        }
    }
    if !draft.trim().is_empty() {
        prompt.push_str(&format!("Draft answer:\n{draft}\n\n"));
    }
    prompt.push_str(ANALYSIS_INSTRUCTIONS);
    prompt
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_cost::TierRates;
    use meridian_test_utils::{overloaded, tool_call, MockGateway, MockToolProvider};
    use serde_json::json;

    struct Fixture {
        standard: Arc<MockGateway>,
        premium: Arc<MockGateway>,
        fallback: Arc<MockGateway>,
        usage: Arc<UsageTracker>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                standard: Arc::new(MockGateway::new("standard-model")),
                premium: Arc::new(MockGateway::new("premium-model")),
                fallback: Arc::new(MockGateway::new("fallback-model")),
                usage: Arc::new(UsageTracker::new(TierRates::default())),
            }
        }

        fn orchestrator(&self, tools: MockToolProvider, with_fallback: bool) -> Orchestrator {
            let fallback =
                with_fallback.then(|| self.fallback.clone() as Arc<dyn ModelGateway>);
            Orchestrator::new(
                self.standard.clone(),
                self.premium.clone(),
                fallback,
                Arc::new(tools),
                self.usage.clone(),
            )
            .with_retry(RetryPolicy::new(3, Duration::from_millis(10)))
            .with_system_prompt("You are an economist.")
        }
    }

    fn nigeria_forecast() -> Value {
        json!({"data": [
            {"country": "Nigeria", "iso": "NGA", "year": 2024, "value": 3.1},
            {"country": "Nigeria", "iso": "NGA", "year": 2025, "value": 3.0}
        ]})
    }

    #[tokio::test]
    async fn plain_answer_takes_one_call() {
        let fx = Fixture::new();
        fx.standard.push_response(GatewayResponse::text("GDP grew.")).await;
        let result = fx
            .orchestrator(MockToolProvider::new(), false)
            .run(Tier::Standard, Vec::new(), "Nigeria GDP?", true)
            .await
            .unwrap();

        assert_eq!(result.text, "GDP grew.");
        assert_eq!(result.iterations, 1);
        assert_eq!(result.model_calls, 1);
        assert_eq!(result.model, "standard-model");
        assert!(result.tools_used.is_empty());
        let requests = fx.standard.requests().await;
        assert_eq!(requests[0].system_prompt.as_deref(), Some("You are an economist."));
        assert_eq!(requests[0].tool_mode, ToolMode::Auto);
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_in_invocation_order() {
        let fx = Fixture::new();
        fx.standard
            .push_response(GatewayResponse::tools(vec![
                ToolInvocation {
                    id: "t1".into(),
                    name: "imf_weo_forecast".into(),
                    arguments: json!({"countries": ["NGA"]}),
                },
                ToolInvocation {
                    id: "t2".into(),
                    name: "missing_tool".into(),
                    arguments: json!({}),
                },
            ]))
            .await;
        fx.standard.push_response(GatewayResponse::text("Done.")).await;
        let tools = MockToolProvider::new().with_result("imf_weo_forecast", nigeria_forecast());

        let result = fx
            .orchestrator(tools, false)
            .run(Tier::Standard, Vec::new(), "Nigeria growth?", true)
            .await
            .unwrap();

        assert_eq!(result.text, "Done.");
        assert_eq!(result.iterations, 2);
        assert_eq!(result.outcomes.len(), 2);
        assert!(!result.outcomes[0].is_error());
        assert!(result.outcomes[1].is_error());
        assert_eq!(
            result.tools_used.iter().collect::<Vec<_>>(),
            vec!["imf_weo_forecast", "missing_tool"]
        );

        let second = &fx.standard.requests().await[1];
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[1].role, Role::Assistant);
        let results = &second.messages[2].content;
        let back = ToolOutcome::from_block("imf_weo_forecast", &results[0]).unwrap();
        assert_eq!(back, ToolOutcome::success("imf_weo_forecast", nigeria_forecast()));
        assert!(matches!(
            &results[1],
            ContentBlock::ToolResult { tool_use_id, is_error: true, .. } if tool_use_id == "t2"
        ));
        assert_eq!(fx.usage.snapshot().tool_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tools_in_one_turn_run_concurrently() {
        let fx = Fixture::new();
        fx.standard
            .push_response(GatewayResponse::tools(vec![
                ToolInvocation {
                    id: "a".into(),
                    name: "worldbank_indicator".into(),
                    arguments: json!({}),
                },
                ToolInvocation {
                    id: "b".into(),
                    name: "owid_series".into(),
                    arguments: json!({}),
                },
            ]))
            .await;
        let tools = MockToolProvider::new()
            .with_result("worldbank_indicator", json!([]))
            .with_delay("worldbank_indicator", Duration::from_secs(5))
            .with_result("owid_series", json!([]))
            .with_delay("owid_series", Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        fx.orchestrator(tools, false)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out_without_aborting_siblings() {
        let fx = Fixture::new();
        fx.standard
            .push_response(GatewayResponse::tools(vec![
                ToolInvocation {
                    id: "a".into(),
                    name: "faostat_production".into(),
                    arguments: json!({}),
                },
                ToolInvocation {
                    id: "b".into(),
                    name: "owid_series".into(),
                    arguments: json!({}),
                },
            ]))
            .await;
        let tools = MockToolProvider::new()
            .with_result("faostat_production", json!([]))
            .with_delay("faostat_production", Duration::from_secs(120))
            .with_result("owid_series", json!({"rows": []}));

        let settings = OrchestratorSettings {
            tool_timeout: Duration::from_secs(1),
            ..OrchestratorSettings::default()
        };
        let result = fx
            .orchestrator(tools, false)
            .with_settings(settings)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap();

        assert!(result.outcomes[0].is_error());
        assert!(result.outcomes[0].content().contains("timed out"));
        assert!(!result.outcomes[1].is_error());
    }

    #[tokio::test]
    async fn error_object_result_is_a_failure_outcome() {
        let fx = Fixture::new();
        fx.standard
            .push_response(tool_call("t1", "comtrade_partners", json!({"reporter": "NGA"})))
            .await;
        let tools = MockToolProvider::new()
            .with_result("comtrade_partners", json!({"error": "quota exceeded"}));

        let result = fx
            .orchestrator(tools, false)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap();
        assert_eq!(
            result.outcomes[0],
            ToolOutcome::failure("comtrade_partners", "quota exceeded")
        );
    }

    #[tokio::test]
    async fn iteration_cap_forces_a_tool_free_summary() {
        let fx = Fixture::new();
        for i in 0..5 {
            fx.standard
                .push_response(tool_call(&format!("t{i}"), "owid_series", json!({})))
                .await;
        }
        fx.standard.push_response(GatewayResponse::text("Summary.")).await;
        let tools = MockToolProvider::new().with_result("owid_series", json!([]));
        let settings = OrchestratorSettings {
            max_iterations: 3,
            ..OrchestratorSettings::default()
        };

        let result = fx
            .orchestrator(tools, false)
            .with_settings(settings)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap();

        assert_eq!(result.iterations, 3);
        assert_eq!(result.model_calls, 4);
        let requests = fx.standard.requests().await;
        assert_eq!(requests.len(), 4);
        let last = &requests[3];
        assert_eq!(last.tool_mode, ToolMode::Disabled);
        assert!(!last.tools.is_empty());
        let trailing = last.messages.last().unwrap();
        assert_eq!(trailing.role, Role::User);
        assert!(trailing.text().contains("final answer"));
    }

    #[tokio::test]
    async fn summary_that_requests_tools_still_yields_text() {
        let fx = Fixture::new();
        for i in 0..3 {
            fx.standard
                .push_response(tool_call(&format!("t{i}"), "owid_series", json!({})))
                .await;
        }
        let tools = MockToolProvider::new().with_result("owid_series", json!([]));
        let settings = OrchestratorSettings {
            max_iterations: 2,
            ..OrchestratorSettings::default()
        };

        let result = fx
            .orchestrator(tools, false)
            .with_settings(settings)
            .run(Tier::Standard, Vec::new(), "Chad GDP", true)
            .await
            .unwrap();

        assert_eq!(result.iterations, 2);
        assert_eq!(result.model_calls, 3);
        assert!(!result.text.trim().is_empty());
        assert!(result.text.contains("owid_series"));
        // The summary's tool request is not executed.
        assert_eq!(result.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn blank_answer_lists_failed_lookups() {
        let fx = Fixture::new();
        fx.standard
            .push_response(tool_call("t1", "worldbank_indicator", json!({})))
            .await;
        fx.standard.push_response(GatewayResponse::text("  ")).await;
        let tools = MockToolProvider::new().with_error("worldbank_indicator", "bad code");

        let result = fx
            .orchestrator(tools, false)
            .run(Tier::Standard, Vec::new(), "Chad GDP", true)
            .await
            .unwrap();

        assert!(result.text.contains("Failed lookups: worldbank_indicator."));
        assert!(!result.text.contains("Data gathered from"));
    }

    #[test]
    fn final_text_prefers_model_text() {
        assert_eq!(final_text(Some("Answer.".into()), &[]), "Answer.");
        let note = final_text(None, &[]);
        assert!(note.contains("No data was gathered"));
    }

    #[tokio::test]
    async fn standard_failure_falls_back_once_from_original_history() {
        let fx = Fixture::new();
        fx.standard
            .push_response(tool_call("t1", "owid_series", json!({})))
            .await;
        fx.standard
            .push_error(MeridianError::provider("invalid request"))
            .await;
        fx.fallback.push_response(GatewayResponse::text("Fallback answer.")).await;
        let tools = MockToolProvider::new().with_result("owid_series", json!([]));

        let prior = vec![Message::user("earlier"), Message::assistant("reply")];
        let result = fx
            .orchestrator(tools, true)
            .run(Tier::Standard, prior, "q", true)
            .await
            .unwrap();

        assert!(result.fallback_used);
        assert_eq!(result.text, "Fallback answer.");
        assert_eq!(result.model, "fallback-model");
        assert!(result.tools_used.is_empty());
        let fallback_requests = fx.fallback.requests().await;
        assert_eq!(fallback_requests.len(), 1);
        assert_eq!(fallback_requests[0].messages.len(), 3);
        assert_eq!(fallback_requests[0].messages[2].text(), "q");

        let usage = fx.usage.snapshot();
        assert_eq!(usage.standard_calls, 1);
        assert_eq!(usage.fallback_calls, 1);
    }

    #[tokio::test]
    async fn fallback_failure_is_not_retried_wholesale() {
        let fx = Fixture::new();
        fx.standard.push_error(MeridianError::provider("bad")).await;
        fx.fallback.push_error(MeridianError::provider("also bad")).await;

        let err = fx
            .orchestrator(MockToolProvider::new(), true)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("also bad"));
        assert_eq!(fx.fallback.call_count().await, 1);
    }

    #[tokio::test]
    async fn without_fallback_standard_error_propagates() {
        let fx = Fixture::new();
        fx.standard.push_error(MeridianError::provider("bad")).await;
        let err = fx
            .orchestrator(MockToolProvider::new(), false)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_before_fallback() {
        let fx = Fixture::new();
        fx.standard.push_error(overloaded()).await;
        fx.standard.push_response(GatewayResponse::text("ok")).await;

        let result = fx
            .orchestrator(MockToolProvider::new(), true)
            .run(Tier::Standard, Vec::new(), "q", true)
            .await
            .unwrap();
        assert_eq!(result.text, "ok");
        assert!(!result.fallback_used);
        assert_eq!(fx.standard.call_count().await, 2);
        assert_eq!(fx.fallback.call_count().await, 0);
    }

    #[tokio::test]
    async fn premium_delegates_tools_then_analyzes() {
        let fx = Fixture::new();
        fx.standard
            .push_response(tool_call("t1", "imf_weo_forecast", json!({"countries": ["NER"]})))
            .await;
        fx.standard.push_response(GatewayResponse::text("Draft.")).await;
        fx.premium.push_response(GatewayResponse::text("Deep analysis.")).await;
        let tools = MockToolProvider::new().with_result(
            "imf_weo_forecast",
            json!({"data": [{"country": "Niger", "year": 2025, "value": 6.5}]}),
        );

        let result = fx
            .orchestrator(tools, false)
            .run(Tier::Premium, Vec::new(), "Debt sustainability for Niger", true)
            .await
            .unwrap();

        assert_eq!(result.tier_used, Tier::Premium);
        assert_eq!(result.text, "Deep analysis.");
        assert_eq!(result.model, "premium-model");
        assert!(result.tools_used.contains("imf_weo_forecast"));
        assert_eq!(result.model_calls, 3);

        let premium_requests = fx.premium.requests().await;
        assert_eq!(premium_requests.len(), 1);
        assert!(premium_requests[0].tools.is_empty());
        let prompt = premium_requests[0].messages.last().unwrap().text();
        assert!(prompt.contains("Debt sustainability for Niger"));
        assert!(prompt.contains("Draft."));
        assert!(prompt.contains("[imf_weo_forecast]"));
        assert!(prompt.contains("Niger"));

        let usage = fx.usage.snapshot();
        assert_eq!(usage.standard_calls, 2);
        assert_eq!(usage.premium_calls, 1);
        assert!((result.cost_usd - usage.total_cost_usd).abs() < 1e-12);
    }

    #[tokio::test]
    async fn failed_premium_analysis_degrades_to_standard_draft() {
        let fx = Fixture::new();
        fx.standard.push_response(GatewayResponse::text("Draft.")).await;
        fx.premium.push_error(MeridianError::provider("context too long")).await;

        let result = fx
            .orchestrator(MockToolProvider::new(), false)
            .run(Tier::Premium, Vec::new(), "assess fiscal space", true)
            .await
            .unwrap();
        assert_eq!(result.text, "Draft.");
        assert_eq!(result.tier_used, Tier::Standard);
        assert_eq!(result.model, "standard-model");
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn tools_disabled_makes_one_tool_free_call() {
        let fx = Fixture::new();
        fx.premium.push_response(GatewayResponse::text("Premium prose.")).await;
        let tools = MockToolProvider::new().with_result("owid_series", json!([]));

        let result = fx
            .orchestrator(tools, false)
            .run(Tier::Premium, Vec::new(), "q", false)
            .await
            .unwrap();
        assert_eq!(result.text, "Premium prose.");
        assert_eq!(result.tier_used, Tier::Premium);
        assert_eq!(fx.standard.call_count().await, 0);
        let request = &fx.premium.requests().await[0];
        assert!(request.tools.is_empty());
        assert_eq!(request.tool_mode, ToolMode::Disabled);
    }

    #[tokio::test]
    async fn tools_disabled_premium_failure_degrades() {
        let fx = Fixture::new();
        fx.premium.push_error(MeridianError::provider("down")).await;
        fx.standard.push_response(GatewayResponse::text("Standard prose.")).await;

        let result = fx
            .orchestrator(MockToolProvider::new(), false)
            .run(Tier::Premium, Vec::new(), "q", false)
            .await
            .unwrap();
        assert_eq!(result.text, "Standard prose.");
        assert_eq!(result.tier_used, Tier::Standard);
        assert!(result.degraded);
    }

    #[test]
    fn analysis_prompt_caps_each_outcome_on_char_boundaries() {
        let outcomes = vec![
            ToolOutcome::success("owid_series", json!("ééééééééééé")),
            ToolOutcome::failure("imf_weo_forecast", "down"),
        ];
        let prompt = analysis_prompt("q", "", &outcomes, 5);
        assert!(prompt.contains("[owid_series]\n\"éééé\n"));
        assert!(prompt.contains("[imf_weo_forecast]\n{\"err\n"));
        assert!(!prompt.contains("Draft answer"));
    }

    #[test]
    fn error_field_detection() {
        assert_eq!(error_field(&json!({"error": "x"})).as_deref(), Some("x"));
        assert_eq!(
            error_field(&json!({"error": {"code": 5}})).as_deref(),
            Some(r#"{"code":5}"#)
        );
        assert!(error_field(&json!({"error": null, "data": []})).is_none());
        assert!(error_field(&json!([1, 2])).is_none());
    }

    #[test]
    fn loop_state_display() {
        assert_eq!(LoopState::AwaitingModel.to_string(), "awaiting_model");
        assert_eq!(LoopState::Done(String::new()).to_string(), "done");
    }
}
