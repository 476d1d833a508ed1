// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools backed by the external data service.
//!
//! Each invocation is one `POST {endpoint}/{tool_name}` with the arguments
//! as the JSON body. The service owns the per-source fetch logic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meridian_config::model::ToolsConfig;
use meridian_core::MeridianError;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogEntry, CATALOG};
use crate::tool::{Tool, ToolRegistry};

/// Maximum number of error-body bytes echoed into a tool error.
const MAX_ERROR_BODY: usize = 512;

/// A catalog tool executed by the remote data service.
pub struct RemoteTool {
    entry: &'static CatalogEntry,
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl RemoteTool {
    pub fn new(
        entry: &'static CatalogEntry,
        client: reqwest::Client,
        endpoint: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            entry,
            client,
            url: format!("{}/{}", endpoint.trim_end_matches('/'), entry.name),
            api_key,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        self.entry.name
    }

    fn description(&self) -> &str {
        self.entry.description
    }

    fn parameters_schema(&self) -> Value {
        (self.entry.schema)()
    }

    async fn invoke(&self, input: &Value) -> Result<Value, MeridianError> {
        let tool_error = |message: String| MeridianError::Tool {
            tool: self.entry.name.to_string(),
            message,
        };

        let mut request = self.client.post(&self.url).json(input);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(tool = self.entry.name, url = %self.url, "invoking remote tool");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tool_error("request timed out".to_string())
            } else {
                tool_error(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| tool_error(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let mut excerpt = body;
            if excerpt.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
            }
            return Err(tool_error(format!("HTTP {}: {excerpt}", status.as_u16())));
        }

        serde_json::from_str(&body).map_err(|e| tool_error(format!("invalid JSON response: {e}")))
    }
}

/// Build the tool registry from configuration.
///
/// Returns an empty registry when no endpoint is configured; the loop then
/// answers without tools.
pub fn build_registry(
    config: &ToolsConfig,
    timeout: Duration,
) -> Result<ToolRegistry, MeridianError> {
    let mut registry = ToolRegistry::new();
    let Some(endpoint) = config.endpoint.as_deref() else {
        warn!("tools.endpoint not set, data tools disabled");
        return Ok(registry);
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MeridianError::Config(format!("failed to build tool HTTP client: {e}")))?;

    for entry in CATALOG {
        if !config.enabled.is_empty() && !config.enabled.iter().any(|n| n == entry.name) {
            continue;
        }
        registry.register(Arc::new(RemoteTool::new(
            entry,
            client.clone(),
            endpoint,
            config.api_key.clone(),
        )));
    }

    for unknown in config
        .enabled
        .iter()
        .filter(|name| !CATALOG.iter().any(|e| e.name == name.as_str()))
    {
        warn!(tool = %unknown, "tools.enabled names a tool not in the catalog");
    }

    info!(count = registry.len(), endpoint, "data tools registered");
    Ok(registry)
}
