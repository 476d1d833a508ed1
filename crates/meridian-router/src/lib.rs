// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query complexity classification and tier routing.
//!
//! This crate provides:
//! - [`QueryClassifier`]: a pure rule table scoring text toward the Premium tier
//! - [`TierRouter`]: override > inline prefix > forced tier > classification
//!
//! Classification is deterministic and makes no network calls.

pub mod classifier;
pub mod router;

pub use classifier::{ClassificationResult, QueryClassifier, Rule, RuleGroup};
pub use router::{parse_tier_override, DecisionSource, RoutingDecision, TierRouter};
