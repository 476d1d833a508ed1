// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Meridian economic-data assistant.
//!
//! This crate provides the trait definitions, error type, and shared data
//! model used throughout the workspace: messages and conversations, tool
//! invocations and outcomes, gateway requests, and the canonical chart
//! representation.

pub mod chart;
pub mod error;
pub mod health;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use chart::{AxisLabels, ChartData, ChartKind, ChartPoint, ChartSeries, MapPoint, XValue};
pub use error::MeridianError;
pub use health::CallHealth;
pub use types::{
    AnswerRequest, AnswerResponse, ContentBlock, Conversation, GatewayHealth, GatewayRequest,
    GatewayResponse, HealthStatus, Message, OutcomePayload, Role, SessionKey, Tier, TokenUsage,
    ToolInvocation, ToolMode, ToolOutcome, ToolSchema, CONVERSATION_CAP,
};

pub use traits::{DataToolProvider, ModelGateway, PluginAdapter, SessionStore};
