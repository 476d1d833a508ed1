// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! [`AnthropicClient`] makes exactly one attempt per call. Overload and
//! rate-limit responses surface as [`MeridianError::Overloaded`] so the
//! caller's retry policy can back off; everything else is final.

use std::time::Duration;

use meridian_core::MeridianError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const PROVIDER: &str = "anthropic";

/// Error types the API uses for temporary capacity problems.
const OVERLOAD_ERROR_TYPES: &[&str] = &["overloaded_error", "rate_limit_error"];

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    /// * `base_url` - Messages endpoint URL
    /// * `timeout` - Per-call timeout
    pub fn new(
        api_key: &str,
        api_version: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, MeridianError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                MeridianError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                MeridianError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MeridianError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    /// Overrides the endpoint URL (proxies, wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sends one non-streaming request and returns the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, MeridianError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MeridianError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    MeridianError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| MeridianError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| MeridianError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Maps a non-2xx response to a transient or non-transient error.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> MeridianError {
    let api_error = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let message = match &api_error {
        Some(api_err) => format!(
            "Anthropic API error ({}): {}",
            api_err.error.type_, api_err.error.message
        ),
        None => format!("API returned {status}: {body}"),
    };

    let overloaded_status = matches!(status.as_u16(), 429 | 503 | 529);
    let overloaded_type = api_error
        .as_ref()
        .is_some_and(|e| OVERLOAD_ERROR_TYPES.contains(&e.error.type_.as_str()));

    if overloaded_status || overloaded_type {
        MeridianError::Overloaded {
            provider: PROVIDER.to_string(),
            message,
        }
    } else {
        MeridianError::provider(message)
    }
}
