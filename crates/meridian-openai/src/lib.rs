// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible gateway for Meridian.
//!
//! Tool definitions are sent as `function` tools. Assistant tool requests
//! come back as `tool_calls`; their results go back as `role: tool`
//! messages keyed by `tool_call_id`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use meridian_config::model::{ModelSlot, OpenAiConfig};
use meridian_core::{
    CallHealth, ContentBlock, GatewayRequest, GatewayResponse, HealthStatus, MeridianError,
    Message, ModelGateway, PluginAdapter, Role, TokenUsage, ToolInvocation, ToolMode,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTool, FunctionCall,
    FunctionDefinition, ToolCall,
};

/// OpenAI gateway bound to one model.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiGateway {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
    health: CallHealth,
}

impl OpenAiGateway {
    pub fn new(config: &OpenAiConfig, slot: &ModelSlot) -> Result<Self, MeridianError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                MeridianError::Config(
                    "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
                )
            })?;

        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %slot.model, "OpenAI gateway initialized");
        Ok(Self::with_client(client, &slot.model, slot.max_tokens))
    }

    pub fn with_client(client: OpenAiClient, model: &str, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_tokens,
            health: CallHealth::new(),
        }
    }

    fn to_chat_request(&self, request: &GatewayRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage::text("system", system.clone()));
        }
        for message in &request.messages {
            messages.extend(convert_message(message));
        }

        let tools: Vec<ChatTool> = request
            .tools
            .iter()
            .map(|schema| ChatTool {
                tool_type: "function",
                function: FunctionDefinition {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    parameters: schema.input_schema.clone(),
                },
            })
            .collect();

        let (tools, tool_choice) = match (tools.is_empty(), request.tool_mode) {
            (true, _) => (None, None),
            (false, ToolMode::Auto) => (Some(tools), None),
            (false, ToolMode::Disabled) => (Some(tools), Some("none".to_string())),
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
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
impl PluginAdapter for OpenAiGateway {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MeridianError> {
        Ok(self.health.status())
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GatewayRequest) -> Result<GatewayResponse, MeridianError> {
        let chat_request = self.to_chat_request(&request);
        debug!(
            model = %self.model,
            messages = chat_request.messages.len(),
            "sending chat completion"
        );
        let result = self
            .client
            .complete(&chat_request)
            .await
            .and_then(convert_response);
        self.health.observe(&result);
        result
    }
}

/// One core message may expand to several chat messages: each tool result
/// is its own `role: tool` message.
fn convert_message(message: &Message) -> Vec<ChatMessage> {
    match message.role {
        Role::Assistant => {
            let tool_calls: Vec<ToolCall> = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                        id: id.clone(),
                        call_type: "function".to_string(),
                        function: FunctionCall {
                            name: name.clone(),
                            arguments: input.to_string(),
                        },
                    }),
                    _ => None,
                })
                .collect();
            let text = message.text();
            vec![ChatMessage {
                role: "assistant".to_string(),
                content: (!text.is_empty()).then_some(text),
                tool_calls,
                tool_call_id: None,
            }]
        }
        Role::User => {
            let mut out = Vec::new();
            for block in &message.content {
                if let ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } = block
                {
                    out.push(ChatMessage {
                        role: "tool".to_string(),
                        content: Some(content.clone()),
                        tool_calls: Vec::new(),
                        tool_call_id: Some(tool_use_id.clone()),
                    });
                }
            }
            let text = message.text();
            if !text.is_empty() {
                out.push(ChatMessage::text("user", text));
            }
            out
        }
    }
}

fn convert_response(response: ChatCompletionResponse) -> Result<GatewayResponse, MeridianError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| MeridianError::provider("no choices in OpenAI response"))?;

    let tool_invocations = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                warn!(
                    tool = %call.function.name,
                    error = %e,
                    "tool call arguments are not valid JSON, passing raw string"
                );
                Value::String(call.function.arguments.clone())
            });
            ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments,
            }
        })
        .collect();

    let usage = response.usage.unwrap_or_default();
    Ok(GatewayResponse {
        text: choice.message.content.filter(|t| !t.is_empty()),
        tool_invocations,
        usage: TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
        model: response.model,
        stop_reason: choice.finish_reason,
    })
}
