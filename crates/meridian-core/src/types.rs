// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the gateway, tool and session traits.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::chart::ChartData;

/// Maximum number of messages retained per conversation.
pub const CONVERSATION_CAP: usize = 20;

/// Key identifying one caller's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    #[default]
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Health of one configured model gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayHealth {
    /// `standard`, `premium` or `fallback`.
    pub role: String,
    pub adapter: String,
    pub version: String,
    pub model: String,
    pub status: HealthStatus,
}

/// Cost/quality bucket selected once per request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Low-cost, high-throughput model. Also drives all tool execution.
    #[default]
    Standard,
    /// High-reasoning model used for final analysis.
    Premium,
}

// --- Messages ---

/// Author of a message in the running history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of structured message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },
    /// A tool call requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// The serialized outcome of a tool call, fed back to the model.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A single message in a conversation or model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user message carrying plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// An assistant message carrying plain text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenation of every text block, ignoring tool blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Ordered message history for one session, capped at [`CONVERSATION_CAP`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: VecDeque<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > CONVERSATION_CAP {
            self.messages.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Copy of the messages, oldest first.
    pub fn to_messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

// --- Tools ---

/// A tool call emitted by a model gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned call identifier, echoed back in the tool result.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Result or error payload of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomePayload {
    Result(Value),
    Error(String),
}

/// Captured outcome of a tool execution. Serializes as
/// `{"tool": ..., "result": ...}` or `{"tool": ..., "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool: String,
    #[serde(flatten)]
    pub payload: OutcomePayload,
}

impl ToolOutcome {
    pub fn success(tool: impl Into<String>, result: Value) -> Self {
        Self {
            tool: tool.into(),
            payload: OutcomePayload::Result(result),
        }
    }

    pub fn failure(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            payload: OutcomePayload::Error(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, OutcomePayload::Error(_))
    }

    /// The result value, if the tool succeeded.
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            OutcomePayload::Result(value) => Some(value),
            OutcomePayload::Error(_) => None,
        }
    }

    /// Model-visible content: the result JSON, or `{"error": ...}`.
    pub fn content(&self) -> String {
        match &self.payload {
            OutcomePayload::Result(value) => value.to_string(),
            OutcomePayload::Error(message) => {
                serde_json::json!({ "error": message }).to_string()
            }
        }
    }

    /// Wrap this outcome as a tool-result block answering `tool_use_id`.
    pub fn to_block(&self, tool_use_id: &str) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.to_string(),
            content: self.content(),
            is_error: self.is_error(),
        }
    }

    /// Rebuild an outcome from a tool-result block and the invoked tool name.
    ///
    /// Returns `None` if `block` is not a tool result.
    pub fn from_block(tool: &str, block: &ContentBlock) -> Option<Self> {
        let ContentBlock::ToolResult {
            content, is_error, ..
        } = block
        else {
            return None;
        };
        let parsed: Value =
            serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.clone()));
        if *is_error {
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| content.clone());
            Some(Self::failure(tool, message))
        } else {
            Some(Self::success(tool, parsed))
        }
    }
}

/// JSON schema describing one callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// --- Gateway request/response ---

/// Whether the model may request tools on this call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Auto,
    /// Tools stay declared (history may reference them) but must not be called.
    Disabled,
}

/// Provider-agnostic generation request.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    pub tool_mode: ToolMode,
    /// Output token limit; `0` uses the gateway's configured default.
    pub max_tokens: u32,
}

/// Token counts reported by a provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider-agnostic generation response.
#[derive(Debug, Clone, Default)]
pub struct GatewayResponse {
    /// Plain text, advisory when tool invocations are also present.
    pub text: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
    pub usage: TokenUsage,
    /// Model identifier reported by the provider.
    pub model: String,
    pub stop_reason: Option<String>,
}

impl GatewayResponse {
    /// A plain-text response, mostly useful in tests and mocks.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            stop_reason: Some("end_turn".to_string()),
            ..Default::default()
        }
    }

    /// A response requesting the given tool calls.
    pub fn tools(invocations: Vec<ToolInvocation>) -> Self {
        Self {
            tool_invocations: invocations,
            stop_reason: Some("tool_use".to_string()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = TokenUsage {
            input_tokens,
            output_tokens,
        };
        self
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_invocations.is_empty()
    }
}

// --- Inbound answer operation ---

fn default_tools_enabled() -> bool {
    true
}

/// Inbound request for one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    pub session_key: String,
    #[serde(default)]
    pub tier_override: Option<Tier>,
    #[serde(default = "default_tools_enabled")]
    pub tools_enabled: bool,
}

impl AnswerRequest {
    pub fn new(query: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_key: session_key.into(),
            tier_override: None,
            tools_enabled: true,
        }
    }
}

/// Full structured answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer_text: String,
    pub tools_used: BTreeSet<String>,
    pub charts: Vec<ChartData>,
    pub tier_used: Tier,
    pub model: String,
    pub estimated_cost_usd: f64,
    pub latency_ms: u64,
}
