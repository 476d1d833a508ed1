// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`ToolRegistry`] resolves tools by name and is the
//! [`DataToolProvider`] handed to the orchestration loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::{DataToolProvider, MeridianError, ToolSchema};
use serde_json::Value;

/// One callable data tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, also the source-prefix carrier (`imf_`, `worldbank_`, ...).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Arbitrary JSON comes back; errors are per call.
    async fn invoke(&self, input: &Value) -> Result<Value, MeridianError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous entry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataToolProvider for ToolRegistry {
    fn tool_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    async fn execute(&self, name: &str, arguments: &Value) -> Result<Value, MeridianError> {
        let tool = self.get(name).ok_or_else(|| MeridianError::Tool {
            tool: name.to_string(),
            message: "unknown tool".to_string(),
        })?;
        tool.invoke(arguments).await
    }
}
