// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-keyed conversation storage.

use async_trait::async_trait;

use crate::error::MeridianError;
use crate::types::{Conversation, SessionKey};

/// Pluggable store for per-session conversations.
///
/// Writes are last-writer-wins. `delete` on a missing key is a no-op.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &SessionKey) -> Result<Option<Conversation>, MeridianError>;

    async fn put(&self, key: &SessionKey, conversation: Conversation) -> Result<(), MeridianError>;

    async fn delete(&self, key: &SessionKey) -> Result<(), MeridianError>;
}
