// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-table query classification.
//!
//! Scores user text against phrase tables that favor the Premium tier
//! (diagnostic frameworks, multi-indicator overviews, analytic requests).
//! Anything below the threshold is Standard. Total over every input,
//! including the empty string.

use meridian_core::Tier;

/// Family of phrases sharing a weight and a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleGroup {
    /// Named diagnostic frameworks and policy-analysis vocabulary.
    DiagnosticFramework,
    /// Requests for a broad, multi-indicator overview.
    Overview,
    /// Generic analytic verbs. Weak on their own.
    Analytic,
}

impl RuleGroup {
    fn reason(self) -> &'static str {
        match self {
            RuleGroup::DiagnosticFramework => "diagnostic framework vocabulary",
            RuleGroup::Overview => "multi-indicator overview request",
            RuleGroup::Analytic => "analytic request",
        }
    }
}

/// One phrase → weight entry.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub phrase: &'static str,
    pub weight: i32,
    pub group: RuleGroup,
}

const fn rule(phrase: &'static str, weight: i32, group: RuleGroup) -> Rule {
    Rule {
        phrase,
        weight,
        group,
    }
}

use RuleGroup::{Analytic, DiagnosticFramework, Overview};

/// Phrase table. Phrases are matched on word boundaries after
/// lowercasing and replacing punctuation with spaces.
pub const RULES: &[Rule] = &[
    rule("debt sustainability", 3, DiagnosticFramework),
    rule("dsa", 3, DiagnosticFramework),
    rule("growth diagnostic", 3, DiagnosticFramework),
    rule("growth diagnostics", 3, DiagnosticFramework),
    rule("binding constraint", 3, DiagnosticFramework),
    rule("binding constraints", 3, DiagnosticFramework),
    rule("hausmann", 3, DiagnosticFramework),
    rule("fiscal space", 3, DiagnosticFramework),
    rule("article iv", 3, DiagnosticFramework),
    rule("macro fiscal", 3, DiagnosticFramework),
    rule("stress test", 3, DiagnosticFramework),
    rule("scenario analysis", 3, DiagnosticFramework),
    rule("counterfactual", 3, DiagnosticFramework),
    rule("structural transformation", 3, DiagnosticFramework),
    rule("economic complexity", 3, DiagnosticFramework),
    rule("policy recommendations", 3, DiagnosticFramework),
    rule("policy options", 3, DiagnosticFramework),
    rule("reform agenda", 3, DiagnosticFramework),
    rule("economic overview", 3, Overview),
    rule("macroeconomic overview", 3, Overview),
    rule("country profile", 3, Overview),
    rule("country brief", 3, Overview),
    rule("deep dive", 3, Overview),
    rule("comprehensive", 3, Overview),
    rule("in depth", 3, Overview),
    rule("full picture", 3, Overview),
    rule("executive summary", 3, Overview),
    rule("overview", 2, Overview),
    rule("summary", 2, Overview),
    rule("summarize", 2, Overview),
    rule("summarise", 2, Overview),
    rule("outlook", 2, Overview),
    rule("analysis", 1, Analytic),
    rule("analyze", 1, Analytic),
    rule("analyse", 1, Analytic),
    rule("assess", 1, Analytic),
    rule("assessment", 1, Analytic),
    rule("evaluate", 1, Analytic),
    rule("implications", 1, Analytic),
    rule("explain why", 1, Analytic),
    rule("drivers", 1, Analytic),
    rule("vulnerabilities", 1, Analytic),
    rule("build", 1, Analytic),
];

/// Indicator vocabulary; naming several at once is a structural cue.
const INDICATOR_TERMS: &[&str] = &[
    "gdp",
    "growth",
    "inflation",
    "debt",
    "unemployment",
    "exports",
    "imports",
    "trade balance",
    "current account",
    "deficit",
    "interest rate",
    "exchange rate",
    "poverty",
    "population",
    "fdi",
    "remittances",
    "reserves",
    "life expectancy",
    "emissions",
    "crop",
    "yield",
];

/// Distinct indicator terms needed for the multi-indicator bonus.
const MULTI_INDICATOR_MIN: usize = 3;
const MULTI_INDICATOR_WEIGHT: i32 = 2;

/// Word count above which a query earns a length bonus.
const LONG_QUERY_WORDS: usize = 40;

/// Default score at or above which a query is Premium.
pub const DEFAULT_PREMIUM_THRESHOLD: i32 = 3;

/// Result of classifying a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub tier: Tier,
    /// Total weight of every matched signal.
    pub score: i32,
    /// Reason of the heaviest matched rule group.
    pub reason: &'static str,
    /// Phrases that contributed to the score, in table order.
    pub matched: Vec<&'static str>,
}

/// Deterministic rule-table classifier.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    premium_threshold: i32,
}

impl QueryClassifier {
    pub fn new() -> Self {
        Self {
            premium_threshold: DEFAULT_PREMIUM_THRESHOLD,
        }
    }

    pub fn with_threshold(premium_threshold: i32) -> Self {
        Self { premium_threshold }
    }

    /// Classify `text` into a tier. Pure and total.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = normalize(text);
        if normalized.trim().is_empty() {
            return ClassificationResult {
                tier: Tier::Standard,
                score: 0,
                reason: "empty query",
                matched: Vec::new(),
            };
        }

        let mut score = 0;
        let mut matched = Vec::new();
        let mut group_weights = [0i32; 3];

        for rule in RULES {
            if contains_phrase(&normalized, rule.phrase) {
                score += rule.weight;
                matched.push(rule.phrase);
                group_weights[rule.group as usize] += rule.weight;
            }
        }

        let indicator_count = INDICATOR_TERMS
            .iter()
            .filter(|term| contains_phrase(&normalized, term))
            .count();
        let multi_indicator = indicator_count >= MULTI_INDICATOR_MIN;
        if multi_indicator {
            score += MULTI_INDICATOR_WEIGHT;
            group_weights[RuleGroup::Overview as usize] += MULTI_INDICATOR_WEIGHT;
        }

        if text.split_whitespace().count() > LONG_QUERY_WORDS {
            score += 1;
        }

        let tier = if score >= self.premium_threshold {
            Tier::Premium
        } else {
            Tier::Standard
        };

        let reason = [DiagnosticFramework, Overview, Analytic]
            .into_iter()
            .filter(|g| group_weights[*g as usize] > 0)
            .max_by_key(|g| group_weights[*g as usize])
            .map(RuleGroup::reason)
            .unwrap_or(if score > 0 {
                "long query"
            } else {
                "no premium indicators"
            });

        ClassificationResult {
            tier,
            score,
            reason,
            matched,
        }
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, map non-alphanumerics to spaces, and pad with spaces so
/// phrases can be matched on word boundaries.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {phrase} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_lookup_is_standard() {
        let c = QueryClassifier::new();
        let result = c.classify("What's Nigeria's GDP growth forecast for 2024-2026?");
        assert_eq!(result.tier, Tier::Standard);
        assert_eq!(result.reason, "no premium indicators");
    }

    #[test]
    fn debt_sustainability_is_premium() {
        let c = QueryClassifier::new();
        let result = c.classify("Build a debt sustainability analysis for Niger");
        assert_eq!(result.tier, Tier::Premium);
        assert_eq!(result.reason, "diagnostic framework vocabulary");
        assert!(result.matched.contains(&"debt sustainability"));
    }

    #[test]
    fn multi_indicator_summary_is_premium() {
        let c = QueryClassifier::new();
        let result = c.classify("Summary of inflation, GDP and debt in Ghana");
        assert_eq!(result.tier, Tier::Premium);
        assert_eq!(result.reason, "multi-indicator overview request");
    }

    #[test]
    fn single_analytic_verb_stays_standard() {
        let c = QueryClassifier::new();
        assert_eq!(
            c.classify("Give me an analysis of Kenya's exports").tier,
            Tier::Standard
        );
    }

    #[test]
    fn phrases_match_on_word_boundaries() {
        let c = QueryClassifier::new();
        // "dsa" inside another word must not count
        let result = c.classify("Show maize yields in Odsanya");
        assert!(!result.matched.contains(&"dsa"));
        // hyphens and case do not matter
        assert!(c.classify("MACRO-FISCAL framework for Chad").matched.contains(&"macro fiscal"));
    }

    #[test]
    fn empty_and_whitespace_are_standard() {
        let c = QueryClassifier::new();
        assert_eq!(c.classify("").tier, Tier::Standard);
        assert_eq!(c.classify("   \n\t").tier, Tier::Standard);
        assert_eq!(c.classify("?!").reason, "empty query");
    }

    #[test]
    fn threshold_is_configurable() {
        let strict = QueryClassifier::with_threshold(10);
        assert_eq!(
            strict
                .classify("Build a debt sustainability analysis for Niger")
                .tier,
            Tier::Standard
        );
        let loose = QueryClassifier::with_threshold(1);
        assert_eq!(
            loose.classify("Give me an analysis of Kenya's exports").tier,
            Tier::Premium
        );
    }

    proptest::proptest! {
        #[test]
        fn classify_is_pure_and_total(text in ".*") {
            let c = QueryClassifier::new();
            let first = c.classify(&text);
            let second = c.classify(&text);
            proptest::prop_assert_eq!(first, second);
        }
    }
}
