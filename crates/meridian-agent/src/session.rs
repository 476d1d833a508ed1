// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process session store.
//!
//! Conversations live in a [`DashMap`] keyed by session key until process
//! exit or an explicit reset. Concurrent writers to one key race; the last
//! `put` wins.

use async_trait::async_trait;
use dashmap::DashMap;
use meridian_core::{Conversation, MeridianError, SessionKey, SessionStore};
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionKey, Conversation>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<Conversation>, MeridianError> {
        Ok(self.sessions.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &SessionKey, conversation: Conversation) -> Result<(), MeridianError> {
        debug!(session = %key, messages = conversation.len(), "session stored");
        self.sessions.insert(key.clone(), conversation);
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), MeridianError> {
        if self.sessions.remove(key).is_some() {
            debug!(session = %key, "session cleared");
        }
        Ok(())
    }
}
