// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Meridian orchestration core.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod gateway;
pub mod session;
pub mod tools;

pub use adapter::PluginAdapter;
pub use gateway::ModelGateway;
pub use session::SessionStore;
pub use tools::DataToolProvider;
