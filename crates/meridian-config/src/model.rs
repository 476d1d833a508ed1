// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Meridian.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Meridian configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeridianConfig {
    /// Assistant identity, logging and system prompt.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic Messages API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI-compatible Chat Completions settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Tier model slots and classification.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Tool-orchestration loop bounds.
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Transient-error retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-tier token rates. Unset tiers use the built-in table for their model.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// External data tool service.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "meridian".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Anthropic API version header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Messages endpoint URL.
    #[serde(default = "default_anthropic_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            base_url: default_anthropic_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    120
}

/// OpenAI-compatible API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat Completions endpoint URL.
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

/// One model slot: which provider and model serve a tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSlot {
    /// Provider name: `anthropic` or `openai`.
    pub provider: String,

    /// Provider model identifier.
    pub model: String,

    /// Maximum tokens to generate per call.
    #[serde(default = "default_slot_max_tokens")]
    pub max_tokens: u32,
}

fn default_slot_max_tokens() -> u32 {
    4096
}

/// Tier routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Model for the Standard tier. Also executes tools for Premium requests.
    #[serde(default = "default_standard_slot")]
    pub standard: ModelSlot,

    /// Model for the Premium tier's final analysis.
    #[serde(default = "default_premium_slot")]
    pub premium: ModelSlot,

    /// Last-resort model used once when the Standard tool phase fails.
    #[serde(default = "default_fallback_slot")]
    pub fallback: ModelSlot,

    /// Enable the fallback model.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Force every request to one tier (`standard` or `premium`), bypassing classification.
    #[serde(default)]
    pub force_tier: Option<String>,

    /// Classifier score at or above which a query is Premium.
    #[serde(default = "default_premium_threshold")]
    pub premium_threshold: i32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            standard: default_standard_slot(),
            premium: default_premium_slot(),
            fallback: default_fallback_slot(),
            fallback_enabled: true,
            force_tier: None,
            premium_threshold: default_premium_threshold(),
        }
    }
}

fn default_standard_slot() -> ModelSlot {
    ModelSlot {
        provider: "anthropic".to_string(),
        model: "claude-haiku-4-5-20251001".to_string(),
        max_tokens: 4096,
    }
}

fn default_premium_slot() -> ModelSlot {
    ModelSlot {
        provider: "anthropic".to_string(),
        model: "claude-opus-4-1-20250805".to_string(),
        max_tokens: 8192,
    }
}

fn default_fallback_slot() -> ModelSlot {
    ModelSlot {
        provider: "anthropic".to_string(),
        model: "claude-sonnet-4-20250514".to_string(),
        max_tokens: 4096,
    }
}

fn default_true() -> bool {
    true
}

fn default_premium_threshold() -> i32 {
    3
}

/// Tool-orchestration loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestrationConfig {
    /// Tool-enabled model calls per loop before the forced summary call.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Timeout for a single data tool call, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Per-outcome character cap in the Premium analysis context block.
    #[serde(default = "default_premium_context_max_chars")]
    pub premium_context_max_chars: usize,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
            premium_context_max_chars: default_premium_context_max_chars(),
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_premium_context_max_chars() -> usize {
    24_000
}

/// Retry policy for transient provider errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per gateway call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff in milliseconds; attempt `n` waits `base * 2^(n-1)`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

/// Token rates in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateConfig {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Per-tier rate overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    #[serde(default)]
    pub standard: Option<RateConfig>,
    #[serde(default)]
    pub premium: Option<RateConfig>,
    #[serde(default)]
    pub fallback: Option<RateConfig>,
}

/// External data tool service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Base URL of the data tool service. Tools are disabled when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional bearer token sent to the data tool service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Restrict the catalog to these tool names. Empty means all.
    #[serde(default)]
    pub enabled: Vec<String>,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind to.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*` routes other than health.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            cors_origins: Vec::new(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

impl MeridianConfig {
    /// Copy of the configuration with secrets replaced, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|_| "[redacted]".to_string())
        }

        let mut copy = self.clone();
        copy.anthropic.api_key = mask(&self.anthropic.api_key);
        copy.openai.api_key = mask(&self.openai.api_key);
        copy.tools.api_key = mask(&self.tools.api_key);
        copy.gateway.bearer_token = mask(&self.gateway.bearer_token);
        copy
    }
}
