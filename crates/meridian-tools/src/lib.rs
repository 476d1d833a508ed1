// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data tools for the Meridian orchestration loop.
//!
//! - [`Tool`] / [`ToolRegistry`]: the registry implements
//!   [`meridian_core::DataToolProvider`] and exports sorted tool schemas.
//! - [`catalog`]: tool names, descriptions and input schemas for the
//!   supported statistical sources.
//! - [`RemoteTool`]: forwards an invocation to the external data service.

pub mod catalog;
pub mod remote;
pub mod tool;

pub use catalog::{CatalogEntry, CATALOG};
pub use remote::{build_registry, RemoteTool};
pub use tool::{Tool, ToolRegistry};
