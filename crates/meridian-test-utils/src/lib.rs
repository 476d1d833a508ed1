// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Meridian integration tests.
//!
//! Provides mock adapters and a test harness for fast, deterministic,
//! CI-runnable tests without model providers or data services.
//!
//! # Components
//!
//! - [`MockGateway`] - Scripted model gateway with request recording
//! - [`MockToolProvider`] - Data tools with canned results, errors and delays
//! - [`TestHarness`] - Builder assembling a full [`meridian_agent::Agent`]

pub mod harness;
pub mod mock_gateway;
pub mod mock_tools;

pub use harness::{TestHarness, TEST_SESSION};
pub use mock_gateway::{overloaded, tool_call, MockGateway};
pub use mock_tools::MockToolProvider;
