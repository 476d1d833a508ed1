// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Meridian orchestration core.

use thiserror::Error;

/// The primary error type used across gateway, tool and session traits.
#[derive(Debug, Error)]
pub enum MeridianError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Model provider errors that must not be retried (bad request, auth, parse failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider signalled temporary overload or rate limiting.
    ///
    /// This is the only variant the retry policy treats as transient.
    #[error("{provider} is temporarily overloaded: {message}")]
    Overloaded { provider: String, message: String },

    /// A data tool failed to produce a result.
    #[error("tool `{tool}` failed: {message}")]
    Tool { tool: String, message: String },

    /// Session store backend errors.
    #[error("session store error: {0}")]
    Session(String),

    /// Requested adapter was not found or not configured.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MeridianError {
    /// Build a non-transient provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` when the failure is eligible for backoff retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Overloaded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_overloaded_is_transient() {
        let overloaded = MeridianError::Overloaded {
            provider: "anthropic".into(),
            message: "529".into(),
        };
        assert!(overloaded.is_transient());

        assert!(!MeridianError::provider("bad request").is_transient());
        assert!(
            !MeridianError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(!MeridianError::Internal("x".into()).is_transient());
    }

    #[test]
    fn display_messages_are_readable() {
        let err = MeridianError::Tool {
            tool: "imf_weo_forecast".into(),
            message: "404".into(),
        };
        assert_eq!(err.to_string(), "tool `imf_weo_forecast` failed: 404");

        let err = MeridianError::Overloaded {
            provider: "anthropic".into(),
            message: "try later".into(),
        };
        assert!(err.to_string().contains("temporarily overloaded"));
    }
}
