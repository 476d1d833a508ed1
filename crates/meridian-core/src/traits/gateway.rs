// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model gateway trait for language model providers (Anthropic, OpenAI-compatible).

use async_trait::async_trait;

use crate::error::MeridianError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GatewayRequest, GatewayResponse};

/// Thin adapter over one provider's generation endpoint.
///
/// Implementations make exactly one remote call per `generate` and never
/// retry internally. Overload and rate-limit signals must surface as
/// [`MeridianError::Overloaded`] so callers can tell them apart from
/// permanent failures.
#[async_trait]
pub trait ModelGateway: PluginAdapter {
    /// The model identifier this gateway sends requests to.
    fn model(&self) -> &str;

    /// Generate a response for the given history, optionally with tools.
    async fn generate(&self, request: GatewayRequest) -> Result<GatewayResponse, MeridianError>;
}
