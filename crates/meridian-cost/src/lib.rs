// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pricing and usage tracking for Meridian.
//!
//! This crate provides:
//! - **Pricing**: per-model rates and per-tier rate tables
//! - **Usage tracker**: in-memory call, token and cost counters with snapshot/reset

pub mod pricing;
pub mod usage;

pub use pricing::{calculate_cost, get_pricing, ModelPricing, TierRates};
pub use usage::{CostBucket, UsageCounters, UsageTracker};
