// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock data tool provider.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meridian_core::{DataToolProvider, MeridianError, ToolSchema};
use serde_json::{json, Value};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Behavior {
    Result(Value),
    Error(String),
}

#[derive(Debug, Clone)]
struct MockTool {
    behavior: Behavior,
    delay: Duration,
}

/// Data tools with canned behavior, configured by builder methods.
///
/// Calls to names that were never registered fail with an "unknown tool"
/// error, like the real registry.
#[derive(Default)]
pub struct MockToolProvider {
    tools: BTreeMap<String, MockTool>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockToolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` returning `result`.
    pub fn with_result(mut self, name: &str, result: Value) -> Self {
        self.tools.insert(
            name.to_string(),
            MockTool {
                behavior: Behavior::Result(result),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Register `name` failing with `message`.
    pub fn with_error(mut self, name: &str, message: &str) -> Self {
        self.tools.insert(
            name.to_string(),
            MockTool {
                behavior: Behavior::Error(message.to_string()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Make an already registered tool sleep before answering.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        if let Some(tool) = self.tools.get_mut(name) {
            tool.delay = delay;
        }
        self
    }

    /// Every (name, arguments) pair executed so far, in call order.
    pub async fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl DataToolProvider for MockToolProvider {
    fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .keys()
            .map(|name| ToolSchema {
                name: name.clone(),
                description: format!("mock tool {name}"),
                input_schema: json!({"type": "object"}),
            })
            .collect()
    }

    async fn execute(&self, name: &str, arguments: &Value) -> Result<Value, MeridianError> {
        self.calls
            .lock()
            .await
            .push((name.to_string(), arguments.clone()));

        let tool = self.tools.get(name).ok_or_else(|| MeridianError::Tool {
            tool: name.to_string(),
            message: "unknown tool".to_string(),
        })?;
        if !tool.delay.is_zero() {
            tokio::time::sleep(tool.delay).await;
        }
        match &tool.behavior {
            Behavior::Result(value) => Ok(value.clone()),
            Behavior::Error(message) => Err(MeridianError::Tool {
                tool: name.to_string(),
                message: message.clone(),
            }),
        }
    }
}
