// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary to the external data tools (statistical API fetchers).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::MeridianError;
use crate::types::ToolSchema;

/// Executes named data tools on behalf of the orchestration loop.
///
/// Each `execute` performs at most one source-specific fetch. Result shapes
/// are arbitrary JSON; callers must not assume a schema.
#[async_trait]
pub trait DataToolProvider: Send + Sync {
    /// Schemas for every tool the model may call, sorted by name.
    fn tool_schemas(&self) -> Vec<ToolSchema>;

    /// Run one tool with the given arguments.
    async fn execute(&self, name: &str, arguments: &Value) -> Result<Value, MeridianError>;
}
