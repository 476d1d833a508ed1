// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude gateway for Meridian.
//!
//! Implements [`ModelGateway`] over the Anthropic Messages API. Tool calls
//! travel as `tool_use` / `tool_result` content blocks; a tool-disabled call
//! keeps the tool definitions but sets `tool_choice: none`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use meridian_config::model::{AnthropicConfig, ModelSlot};
use meridian_core::{
    CallHealth, ContentBlock, GatewayRequest, GatewayResponse, HealthStatus, MeridianError,
    Message, ModelGateway, PluginAdapter, Role, TokenUsage, ToolInvocation, ToolMode,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContent, ApiContentBlock, ApiMessage, MessageRequest, MessageResponse,
    ResponseContentBlock, ToolChoice, ToolDefinition,
};

/// Anthropic gateway bound to one model.
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicGateway {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
    health: CallHealth,
}

impl AnthropicGateway {
    /// Creates a gateway for the model named by `slot`.
    pub fn new(config: &AnthropicConfig, slot: &ModelSlot) -> Result<Self, MeridianError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %slot.model, "Anthropic gateway initialized");
        Ok(Self::with_client(client, &slot.model, slot.max_tokens))
    }

    /// Creates a gateway with an existing client.
    pub fn with_client(client: AnthropicClient, model: &str, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_tokens,
            health: CallHealth::new(),
        }
    }

    /// Converts a [`GatewayRequest`] to an Anthropic [`MessageRequest`].
    fn to_message_request(&self, request: &GatewayRequest) -> MessageRequest {
        let messages = request.messages.iter().map(convert_message).collect();

        let tools: Vec<ToolDefinition> = request
            .tools
            .iter()
            .map(|schema| ToolDefinition {
                name: schema.name.clone(),
                description: schema.description.clone(),
                input_schema: schema.input_schema.clone(),
            })
            .collect();

        // Declared tools are needed whenever history carries tool blocks.
        let (tools, tool_choice) = match (tools.is_empty(), request.tool_mode) {
            (true, _) => (None, None),
            (false, ToolMode::Auto) => (Some(tools), None),
            (false, ToolMode::Disabled) => (Some(tools), Some(ToolChoice::None)),
        };

        MessageRequest {
            model: self.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: if request.max_tokens == 0 {
                self.max_tokens
            } else {
                request.max_tokens
            },
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicGateway {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MeridianError> {
        Ok(self.health.status())
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GatewayRequest) -> Result<GatewayResponse, MeridianError> {
        let api_request = self.to_message_request(&request);
        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.as_ref().map_or(0, Vec::len),
            "sending Anthropic request"
        );
        let result = self
            .client
            .complete_message(&api_request)
            .await
            .map(convert_response);
        self.health.observe(&result);
        result
    }
}

fn convert_response(response: MessageResponse) -> GatewayResponse {
    let mut text = String::new();
    let mut tool_invocations = Vec::new();
    for block in response.content {
        match block {
            ResponseContentBlock::Text { text: t } => text.push_str(&t),
            ResponseContentBlock::ToolUse { id, name, input } => {
                tool_invocations.push(ToolInvocation {
                    id,
                    name,
                    arguments: input,
                });
            }
            ResponseContentBlock::Other => {}
        }
    }

    GatewayResponse {
        text: (!text.is_empty()).then_some(text),
        tool_invocations,
        usage: TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
        model: response.model,
        stop_reason: response.stop_reason,
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, MeridianError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        MeridianError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

/// Converts a core [`Message`] to an Anthropic [`ApiMessage`].
fn convert_message(message: &Message) -> ApiMessage {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    if message.content.len() == 1
        && let ContentBlock::Text { text } = &message.content[0]
    {
        return ApiMessage {
            role: role.to_string(),
            content: ApiContent::Text(text.clone()),
        };
    }

    let blocks = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ApiContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: is_error.then_some(true),
            },
        })
        .collect();

    ApiMessage {
        role: role.to_string(),
        content: ApiContent::Blocks(blocks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{ToolOutcome, ToolSchema};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(base_url: &str) -> AnthropicGateway {
        let client = AnthropicClient::new(
            "test-key",
            "2023-06-01",
            base_url,
            Duration::from_secs(5),
        )
        .unwrap();
        AnthropicGateway::with_client(client, "claude-haiku-4-5-20251001", 4096)
    }

    fn imf_schema() -> ToolSchema {
        ToolSchema {
            name: "imf_weo_forecast".into(),
            description: "IMF forecasts".into(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn config_key_wins_over_env() {
        let key = resolve_api_key(&Some("sk-config".into())).unwrap();
        assert_eq!(key, "sk-config");
    }

    #[test]
    fn disabled_mode_keeps_tools_and_sets_choice_none() {
        let gw = gateway("http://localhost:1");
        let request = GatewayRequest {
            messages: vec![Message::user("hi")],
            tools: vec![imf_schema()],
            tool_mode: ToolMode::Disabled,
            ..Default::default()
        };
        let api = gw.to_message_request(&request);
        assert_eq!(api.tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(api.tool_choice, Some(ToolChoice::None));
        assert_eq!(api.max_tokens, 4096);
    }

    #[test]
    fn no_tools_means_no_tool_fields() {
        let gw = gateway("http://localhost:1");
        let request = GatewayRequest {
            messages: vec![Message::user("hi")],
            max_tokens: 100,
            ..Default::default()
        };
        let api = gw.to_message_request(&request);
        assert!(api.tools.is_none());
        assert!(api.tool_choice.is_none());
        assert_eq!(api.max_tokens, 100);
    }

    #[test]
    fn tool_blocks_convert_to_api_blocks() {
        let outcome = ToolOutcome::failure("imf_weo_forecast", "timeout");
        let message = Message {
            role: Role::User,
            content: vec![outcome.to_block("tu_1")],
        };
        let api = convert_message(&message);
        let value = serde_json::to_value(&api).unwrap();
        assert_eq!(value["content"][0]["type"], "tool_result");
        assert_eq!(value["content"][0]["tool_use_id"], "tu_1");
        assert_eq!(value["content"][0]["is_error"], true);
    }

    #[tokio::test]
    async fn generate_maps_tool_use_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "model": "claude-haiku-4-5-20251001",
                "tools": [{"name": "imf_weo_forecast"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Let me check."},
                    {"type": "tool_use", "id": "tu_1", "name": "imf_weo_forecast",
                     "input": {"countries": ["NGA"], "indicator": "NGDP_RPCH"}}
                ],
                "model": "claude-haiku-4-5-20251001",
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 120, "output_tokens": 30}
            })))
            .mount(&server)
            .await;

        let response = gateway(&server.uri())
            .generate(GatewayRequest {
                system_prompt: Some("You are an economist.".into()),
                messages: vec![Message::user("Nigeria growth?")],
                tools: vec![imf_schema()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(response.requests_tools());
        assert_eq!(response.tool_invocations[0].name, "imf_weo_forecast");
        assert_eq!(response.tool_invocations[0].arguments["countries"][0], "NGA");
        assert_eq!(response.text.as_deref(), Some("Let me check."));
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    }

    #[tokio::test]
    async fn generate_propagates_overload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let gw = gateway(&server.uri());
        let err = gw
            .generate(GatewayRequest {
                messages: vec![Message::user("hi")],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MeridianError::Overloaded { .. }));
        assert!(matches!(
            gw.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[test]
    fn adapter_metadata() {
        let gw = gateway("http://localhost:1");
        assert_eq!(gw.name(), "anthropic");
        assert_eq!(gw.version().major, 0);
        assert_eq!(gw.model(), "claude-haiku-4-5-20251001");
    }
}
