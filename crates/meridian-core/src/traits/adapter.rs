// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by model gateways.

use async_trait::async_trait;

use crate::error::MeridianError;
use crate::types::HealthStatus;

/// Identity and health check for every pluggable adapter.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the adapter's current status. Must not spend provider tokens.
    async fn health_check(&self) -> Result<HealthStatus, MeridianError>;
}
