// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use meridian_agent::Agent;
use meridian_config::model::GatewayConfig;
use meridian_core::MeridianError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    /// Process start time for uptime calculation.
    pub started: Instant,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            started: Instant::now(),
        }
    }
}

/// Build the gateway router.
///
/// Health is public; every other route sits behind [`auth_middleware`].
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone().filter(|t| !t.is_empty()),
    };

    let public_routes = Router::new()
        .route("/v1/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/answer", post(handlers::post_answer))
        .route("/v1/sessions/{key}", delete(handlers::delete_session))
        .route("/v1/usage", get(handlers::get_usage))
        .route("/v1/usage/reset", post(handlers::post_usage_reset))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

/// Refuse an unauthenticated gateway on anything but loopback.
pub fn ensure_bind_allowed(config: &GatewayConfig) -> Result<(), MeridianError> {
    let has_token = config.bearer_token.as_deref().is_some_and(|t| !t.is_empty());
    if has_token || is_loopback(&config.host) {
        return Ok(());
    }
    Err(MeridianError::Config(format!(
        "gateway.bearer_token must be set to bind to non-loopback address {}",
        config.host
    )))
}

fn is_loopback(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &GatewayConfig, agent: Arc<Agent>, shutdown: F) -> Result<(), MeridianError>
where
    F: Future<Output = ()> + Send + 'static,
{
    ensure_bind_allowed(config)?;
    let app = build_router(config, AppState::new(agent));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MeridianError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    info!(
        addr = %addr,
        auth = config.bearer_token.is_some(),
        "gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MeridianError::Internal(format!("gateway server error: {e}")))?;

    info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use meridian_core::{GatewayResponse, HealthStatus, MeridianError};
    use meridian_test_utils::TestHarness;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn config(token: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            bearer_token: token.map(str::to_string),
            ..GatewayConfig::default()
        }
    }

    fn app(harness: TestHarness, token: Option<&str>) -> Router {
        let TestHarness { agent, .. } = harness;
        build_router(&config(token), AppState::new(Arc::new(agent)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn answer_request(query: &str) -> Request<Body> {
        Request::post("/v1/answer")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"query": query, "session_key": "web-1"}).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app(TestHarness::builder().build(), Some("secret"));
        let response = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        let roles: Vec<&str> = body["gateways"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["standard", "premium"]);
    }

    #[tokio::test]
    async fn degraded_gateway_degrades_health() {
        let harness = TestHarness::builder().build();
        harness
            .standard
            .set_health(HealthStatus::Degraded("anthropic overloaded".into()))
            .await;
        let response = app(harness, None)
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        let standard = &body["gateways"][0];
        assert_eq!(standard["role"], "standard");
        assert_eq!(standard["status"]["state"], "degraded");
        assert_eq!(standard["status"]["detail"], "anthropic overloaded");
        assert_eq!(body["gateways"][1]["status"]["state"], "healthy");
    }

    #[tokio::test]
    async fn answer_requires_the_configured_token() {
        let app = app(TestHarness::builder().build(), Some("secret"));

        let response = app.clone().oneshot(answer_request("Chad GDP")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = answer_request("Chad GDP");
        request
            .headers_mut()
            .insert("authorization", HeaderValue::from_static("Bearer wrong"));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = answer_request("Chad GDP");
        request
            .headers_mut()
            .insert("authorization", HeaderValue::from_static("Bearer secret"));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer_text"], "mock answer");
        assert_eq!(body["tier_used"], "standard");
    }

    #[tokio::test]
    async fn agent_error_is_502_with_message() {
        let harness = TestHarness::builder()
            .with_standard(vec![Err(MeridianError::provider("invalid api key"))])
            .build();
        let response = app(harness, None)
            .oneshot(answer_request("Chad GDP"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid api key"));
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let response = app(TestHarness::builder().build(), None)
            .oneshot(answer_request("   "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let app = app(TestHarness::builder().build(), None);

        let request = Request::post("/v1/answer")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "Chad GDP""#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().is_empty());

        let request = Request::post("/v1/answer")
            .header("content-type", "application/json")
            .body(Body::from(json!({"session_key": "web-1"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("query"));

        let request = Request::post("/v1/answer")
            .body(Body::from(json!({"query": "q", "session_key": "s"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn usage_snapshot_and_reset() {
        let harness = TestHarness::builder()
            .with_standard(vec![Ok(GatewayResponse::text("ok").with_usage(1000, 500))])
            .build();
        let app = app(harness, None);

        app.clone().oneshot(answer_request("Chad GDP")).await.unwrap();
        let response = app
            .clone()
            .oneshot(Request::get("/v1/usage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let usage = body_json(response).await;
        assert_eq!(usage["standard_calls"], 1);
        assert_eq!(usage["input_tokens"], 1000);

        let response = app
            .clone()
            .oneshot(Request::post("/v1/usage/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::get("/v1/usage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["standard_calls"], 0);
    }

    #[tokio::test]
    async fn delete_session_is_idempotent() {
        let app = app(TestHarness::builder().build(), None);
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::delete("/v1/sessions/web-1")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
    }

    #[test]
    fn unauthenticated_bind_is_loopback_only() {
        let mut cfg = config(None);
        for host in ["127.0.0.1", "localhost", "::1", "[::1]"] {
            cfg.host = host.to_string();
            assert!(ensure_bind_allowed(&cfg).is_ok(), "{host}");
        }
        cfg.host = "0.0.0.0".to_string();
        assert!(ensure_bind_allowed(&cfg).is_err());

        let mut cfg = config(Some("secret"));
        cfg.host = "0.0.0.0".to_string();
        assert!(ensure_bind_allowed(&cfg).is_ok());
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        let _layer = cors_layer(&["https://ok.example".to_string(), "bad\norigin".to_string()]);
    }
}
