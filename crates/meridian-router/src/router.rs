// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier routing with explicit and inline overrides.
//!
//! Priority: caller override > inline `/premium` / `/standard` prefix >
//! `routing.force_tier` > classification.

use std::str::FromStr;

use meridian_config::model::RoutingConfig;
use meridian_core::Tier;
use tracing::{debug, warn};

use crate::classifier::QueryClassifier;

/// Where a routing decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    CallerOverride,
    InlinePrefix,
    ForcedByConfig,
    Classified,
}

/// The tier chosen for one request and the query text to send onward.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub tier: Tier,
    /// Query with any inline override prefix stripped.
    pub query: String,
    pub source: DecisionSource,
    /// Classifier score, when classification ran.
    pub score: Option<i32>,
    pub reason: String,
}

/// Selects the tier for each request.
pub struct TierRouter {
    classifier: QueryClassifier,
    force_tier: Option<Tier>,
}

impl TierRouter {
    /// Create a router from the routing configuration.
    ///
    /// An unparseable `force_tier` is ignored with a warning; config
    /// validation normally rejects it first.
    pub fn new(config: &RoutingConfig) -> Self {
        let force_tier = config
            .force_tier
            .as_deref()
            .and_then(|raw| match Tier::from_str(raw) {
                Ok(tier) => Some(tier),
                Err(_) => {
                    warn!(force_tier = raw, "ignoring unknown routing.force_tier");
                    None
                }
            });
        Self {
            classifier: QueryClassifier::with_threshold(config.premium_threshold),
            force_tier,
        }
    }

    /// Route a query. `tier_override` is the caller-supplied override.
    pub fn route(&self, query: &str, tier_override: Option<Tier>) -> RoutingDecision {
        let (inline, clean) = parse_tier_override(query);
        let clean = clean.to_string();

        if let Some(tier) = tier_override {
            return RoutingDecision {
                tier,
                query: clean,
                source: DecisionSource::CallerOverride,
                score: None,
                reason: "caller override".to_string(),
            };
        }

        if let Some(tier) = inline {
            return RoutingDecision {
                tier,
                query: clean,
                source: DecisionSource::InlinePrefix,
                score: None,
                reason: "inline override".to_string(),
            };
        }

        if let Some(tier) = self.force_tier {
            return RoutingDecision {
                tier,
                query: clean,
                source: DecisionSource::ForcedByConfig,
                score: None,
                reason: "routing.force_tier".to_string(),
            };
        }

        let classification = self.classifier.classify(&clean);
        debug!(
            tier = %classification.tier,
            score = classification.score,
            matched = ?classification.matched,
            "classified query"
        );
        RoutingDecision {
            tier: classification.tier,
            query: clean,
            source: DecisionSource::Classified,
            score: Some(classification.score),
            reason: classification.reason.to_string(),
        }
    }
}

/// Parse an inline tier override prefix.
///
/// Supports `/premium ` and `/standard ` (with trailing space). Returns the
/// tier and the remaining text, or `(None, original)` if no prefix is present.
pub fn parse_tier_override(text: &str) -> (Option<Tier>, &str) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("/premium ") {
        (Some(Tier::Premium), rest)
    } else if let Some(rest) = trimmed.strip_prefix("/standard ") {
        (Some(Tier::Standard), rest)
    } else {
        (None, text)
    }
}
