// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Meridian.
//!
//! Exposes the agent's operations over JSON:
//!
//! - `GET /v1/health` (unauthenticated)
//! - `POST /v1/answer`
//! - `DELETE /v1/sessions/{key}`
//! - `GET /v1/usage`
//! - `POST /v1/usage/reset`
//!
//! Non-health routes require `Authorization: Bearer <token>` when a token is
//! configured. Without a token the server only binds to loopback addresses.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use handlers::{ErrorResponse, HealthResponse};
pub use server::{build_router, ensure_bind_allowed, serve, AppState};
