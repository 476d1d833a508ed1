// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the gateway routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meridian_core::{AnswerRequest, GatewayHealth};
use meridian_cost::UsageCounters;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::server::AppState;

/// Response body for GET /v1/health.
///
/// `status` is "ok" when every gateway is healthy, otherwise "degraded".
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub gateways: Vec<GatewayHealth>,
}

/// Error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// GET /v1/health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateways = state.agent.gateway_health().await;
    let status = if gateways.iter().all(|g| g.status.is_healthy()) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        gateways,
    })
}

/// POST /v1/answer
///
/// Runs one query through the agent. Malformed bodies become 400 and agent
/// failures become 502, both with an `{"error": ..}` body.
pub async fn post_answer(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if body.query.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "query must not be empty");
    }
    if body.session_key.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "session_key must not be empty");
    }

    let session = body.session_key.clone();
    match state.agent.answer(body).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => {
            warn!(session = %session, error = %e, "answer failed");
            error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// DELETE /v1/sessions/{key}
pub async fn delete_session(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.agent.reset_session(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /v1/usage
pub async fn get_usage(State(state): State<AppState>) -> Json<UsageCounters> {
    Json(state.agent.usage_snapshot())
}

/// POST /v1/usage/reset
pub async fn post_usage_reset(State(state): State<AppState>) -> StatusCode {
    state.agent.reset_usage();
    StatusCode::NO_CONTENT
}
