// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passive health tracking for adapters.
//!
//! Health checks must not spend provider tokens, so adapters report the
//! result of their most recent real call instead of probing.

use std::sync::{Mutex, PoisonError};

use crate::error::MeridianError;
use crate::types::HealthStatus;

/// Remembers how an adapter's last call ended.
#[derive(Debug, Default)]
pub struct CallHealth {
    last: Mutex<HealthStatus>,
}

impl CallHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one call.
    ///
    /// Transient failures mark the adapter degraded; any other failure
    /// marks it unhealthy until the next success.
    pub fn observe<T>(&self, result: &Result<T, MeridianError>) {
        let status = match result {
            Ok(_) => HealthStatus::Healthy,
            Err(e) if e.is_transient() => HealthStatus::Degraded(e.to_string()),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Status as of the most recent call; healthy before any call.
    pub fn status(&self) -> HealthStatus {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_the_latest_call() {
        let health = CallHealth::new();
        assert_eq!(health.status(), HealthStatus::Healthy);

        health.observe::<()>(&Err(MeridianError::Overloaded {
            provider: "anthropic".into(),
            message: "529".into(),
        }));
        assert!(matches!(health.status(), HealthStatus::Degraded(m) if m.contains("529")));

        health.observe::<()>(&Err(MeridianError::provider("invalid x-api-key")));
        assert!(matches!(health.status(), HealthStatus::Unhealthy(m) if m.contains("x-api-key")));

        health.observe(&Ok(()));
        assert_eq!(health.status(), HealthStatus::Healthy);
    }
}
