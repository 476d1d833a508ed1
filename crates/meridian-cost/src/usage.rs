// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory usage counters.
//!
//! A [`UsageTracker`] is an explicit instance shared by `Arc` between the
//! orchestrator and the HTTP gateway. Counters only grow until `reset()`.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use meridian_core::{Tier, TokenUsage};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::pricing::{calculate_cost, TierRates};

/// Which rate table a gateway call is billed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum CostBucket {
    Standard,
    Premium,
    Fallback,
}

impl From<Tier> for CostBucket {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Standard => CostBucket::Standard,
            Tier::Premium => CostBucket::Premium,
        }
    }
}

/// Point-in-time copy of the usage counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub standard_calls: u64,
    pub premium_calls: u64,
    pub fallback_calls: u64,
    pub tool_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost_usd: f64,
    /// When counting started (process start or last reset).
    pub since: DateTime<Utc>,
}

impl UsageCounters {
    fn zero() -> Self {
        Self {
            standard_calls: 0,
            premium_calls: 0,
            fallback_calls: 0,
            tool_calls: 0,
            input_tokens: 0,
            output_tokens: 0,
            total_cost_usd: 0.0,
            since: Utc::now(),
        }
    }

    pub fn total_calls(&self) -> u64 {
        self.standard_calls + self.premium_calls + self.fallback_calls
    }
}

/// Running call, token and cost counters.
pub struct UsageTracker {
    rates: TierRates,
    counters: Mutex<UsageCounters>,
}

impl UsageTracker {
    pub fn new(rates: TierRates) -> Self {
        Self {
            rates,
            counters: Mutex::new(UsageCounters::zero()),
        }
    }

    /// Record one gateway call for `tier` and return its cost in USD.
    pub fn record(&self, tier: Tier, input_tokens: u32, output_tokens: u32) -> f64 {
        self.record_bucket(tier.into(), input_tokens, output_tokens)
    }

    /// Record one call made by the fallback gateway.
    pub fn record_fallback(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        self.record_bucket(CostBucket::Fallback, input_tokens, output_tokens)
    }

    /// Record one call against an explicit bucket and return its cost in USD.
    pub fn record_bucket(&self, bucket: CostBucket, input_tokens: u32, output_tokens: u32) -> f64 {
        let usage = TokenUsage {
            input_tokens,
            output_tokens,
        };
        let cost = calculate_cost(&usage, self.rates.for_bucket(bucket));

        let mut counters = self.lock();
        match bucket {
            CostBucket::Standard => counters.standard_calls += 1,
            CostBucket::Premium => counters.premium_calls += 1,
            CostBucket::Fallback => counters.fallback_calls += 1,
        }
        counters.input_tokens += u64::from(input_tokens);
        counters.output_tokens += u64::from(output_tokens);
        counters.total_cost_usd += cost;

        debug!(
            bucket = %bucket,
            input_tokens,
            output_tokens,
            cost_usd = cost,
            "usage recorded"
        );
        cost
    }

    pub fn tool_call_recorded(&self) {
        self.lock().tool_calls += 1;
    }

    pub fn snapshot(&self) -> UsageCounters {
        self.lock().clone()
    }

    /// Zero every counter.
    pub fn reset(&self) {
        let mut counters = self.lock();
        info!(
            total_cost_usd = counters.total_cost_usd,
            calls = counters.total_calls(),
            "usage counters reset"
        );
        *counters = UsageCounters::zero();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UsageCounters> {
        // Counters are plain numbers; a panic mid-update cannot leave them invalid.
        self.counters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(TierRates::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn repeated_record_doubles_cost_exactly() {
        let tracker = UsageTracker::default();
        let single = tracker.record(Tier::Standard, 1000, 500);
        tracker.record(Tier::Standard, 1000, 500);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total_cost_usd, 2.0 * single);
        assert_eq!(snapshot.standard_calls, 2);
        assert_eq!(snapshot.input_tokens, 2000);
        assert_eq!(snapshot.output_tokens, 1000);
    }

    #[test]
    fn reset_zeroes_everything() {
        let tracker = UsageTracker::default();
        tracker.record(Tier::Premium, 10, 10);
        tracker.record_fallback(10, 10);
        tracker.tool_call_recorded();
        tracker.reset();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total_cost_usd, 0.0);
        assert_eq!(snapshot.total_calls(), 0);
        assert_eq!(snapshot.tool_calls, 0);
    }

    #[test]
    fn buckets_use_their_own_rates() {
        let tracker = UsageTracker::default();
        let standard = tracker.record(Tier::Standard, 1_000_000, 0);
        let premium = tracker.record(Tier::Premium, 1_000_000, 0);
        let fallback = tracker.record_fallback(1_000_000, 0);
        assert!((standard - 0.80).abs() < 1e-9);
        assert!((premium - 15.0).abs() < 1e-9);
        assert!((fallback - 3.0).abs() < 1e-9);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.standard_calls, 1);
        assert_eq!(snapshot.premium_calls, 1);
        assert_eq!(snapshot.fallback_calls, 1);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let tracker = UsageTracker::default();
        let before = tracker.snapshot();
        tracker.tool_call_recorded();
        assert_eq!(before.tool_calls, 0);
        assert_eq!(tracker.snapshot().tool_calls, 1);
    }

    #[test]
    fn snapshot_serializes() {
        let tracker = UsageTracker::default();
        tracker.record(Tier::Standard, 1, 1);
        let json = serde_json::to_value(tracker.snapshot()).unwrap();
        assert_eq!(json["standard_calls"], 1);
        assert!(json["since"].is_string());
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let tracker = Arc::new(UsageTracker::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move {
                    for _ in 0..100 {
                        tracker.tool_call_recorded();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tracker.snapshot().tool_calls, 800);
    }
}
