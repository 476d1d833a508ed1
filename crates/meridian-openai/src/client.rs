// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible Chat Completions endpoints.

use std::time::Duration;

use meridian_core::MeridianError;
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

const PROVIDER: &str = "openai";

/// Error types/codes that mean "try again later".
const OVERLOAD_MARKERS: &[&str] = &[
    "overloaded_error",
    "rate_limit_error",
    "rate_limit_exceeded",
    "server_overloaded",
];

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, MeridianError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MeridianError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            timeout,
        })
    }

    /// Sends one completion request. No retry.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, MeridianError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
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
                        message: format!("OpenAI request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "chat completion received");

        let body = response.text().await.map_err(|e| MeridianError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| MeridianError::Provider {
            message: format!("failed to parse OpenAI response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

pub(crate) fn classify_error(status: StatusCode, body: &str) -> MeridianError {
    let api_error = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let message = match &api_error {
        Some(err) => format!("OpenAI API error ({status}): {}", err.error.message),
        None => format!("OpenAI API error ({status}): {body}"),
    };

    let marked = api_error.as_ref().is_some_and(|err| {
        [err.error.type_.as_deref(), err.error.code.as_deref()]
            .into_iter()
            .flatten()
            .any(|marker| OVERLOAD_MARKERS.contains(&marker))
    });

    if marked || matches!(status.as_u16(), 429 | 503 | 529) {
        MeridianError::Overloaded {
            provider: PROVIDER.to_string(),
            message,
        }
    } else {
        MeridianError::provider(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_detection() {
        assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_error(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        let coded = r#"{"error":{"message":"slow down","type":"tokens","code":"rate_limit_exceeded"}}"#;
        assert!(classify_error(StatusCode::BAD_REQUEST, coded).is_transient());
        let auth = r#"{"error":{"message":"bad key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = classify_error(StatusCode::UNAUTHORIZED, auth);
        assert!(!err.is_transient());
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn debug_redacts_key() {
        let client =
            OpenAiClient::new("sk-secret", "http://localhost", Duration::from_secs(1)).unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
