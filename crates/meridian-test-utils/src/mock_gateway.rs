// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model gateway for deterministic testing.
//!
//! `MockGateway` implements `ModelGateway` with a scripted FIFO of responses
//! and errors. Every request is recorded together with the instant it
//! arrived, so tests can assert on history contents and backoff timing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::{
    GatewayRequest, GatewayResponse, HealthStatus, MeridianError, ModelGateway,
    PluginAdapter, ToolInvocation,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

type Scripted = Result<GatewayResponse, MeridianError>;

/// A model gateway that replays scripted results.
///
/// When the script is exhausted a plain "mock answer" text is returned.
pub struct MockGateway {
    model: String,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<GatewayRequest>>>,
    call_times: Arc<Mutex<Vec<Instant>>>,
    health: Arc<Mutex<HealthStatus>>,
}

impl MockGateway {
    /// Create a gateway reporting `model` with an empty script.
    pub fn new(model: &str) -> Self {
        Self::with_script(model, Vec::new())
    }

    /// Create a gateway pre-loaded with the given results.
    pub fn with_script(model: &str, script: Vec<Scripted>) -> Self {
        Self {
            model: model.to_string(),
            script: Arc::new(Mutex::new(VecDeque::from(script))),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_times: Arc::new(Mutex::new(Vec::new())),
            health: Arc::new(Mutex::new(HealthStatus::Healthy)),
        }
    }

    /// Queue a successful response.
    pub async fn push_response(&self, response: GatewayResponse) {
        self.script.lock().await.push_back(Ok(response));
    }

    /// Queue an error.
    pub async fn push_error(&self, error: MeridianError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Status reported by subsequent health checks.
    pub async fn set_health(&self, status: HealthStatus) {
        *self.health.lock().await = status;
    }

    /// Instants at which each request arrived.
    pub async fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().await.clone()
    }

    async fn next(&self) -> Scripted {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayResponse::text("mock answer").with_usage(10, 20)))
    }
}

/// A response requesting one call of `name` with `arguments`.
pub fn tool_call(id: &str, name: &str, arguments: Value) -> GatewayResponse {
    GatewayResponse::tools(vec![ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }])
    .with_usage(10, 20)
}

/// The transient error a real provider reports when overloaded.
pub fn overloaded() -> MeridianError {
    MeridianError::Overloaded {
        provider: "mock".to_string(),
        message: "overloaded".to_string(),
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MeridianError> {
        Ok(self.health.lock().await.clone())
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GatewayRequest) -> Result<GatewayResponse, MeridianError> {
        self.call_times.lock().await.push(Instant::now());
        self.requests.lock().await.push(request);
        let mut response = self.next().await?;
        if response.model.is_empty() {
            response.model = self.model.clone();
        }
        Ok(response)
    }
}
