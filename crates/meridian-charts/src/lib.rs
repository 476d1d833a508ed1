// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result normalization for Meridian.
//!
//! Tool results arrive in whatever shape each statistical source uses.
//! [`normalize`] recognizes the source from the tool name, parses rows into
//! tagged records, and turns them into canonical [`ChartData`]: `line` for
//! time series, `bar` for cross-section comparisons and trade partners, and
//! `map` when the query asks for geographic coverage.

pub mod build;
pub mod probe;
pub mod query;
pub mod source;

use std::collections::HashSet;

use meridian_core::{ChartData, ToolOutcome};
use tracing::debug;

pub use query::QueryScope;
pub use source::{IndicatorRecord, PartnerRecord, SourceKind, SourceRecord};

/// Charts with fewer non-null points than this are not worth drawing.
pub const MIN_CHART_POINTS: usize = 2;

/// Convert collected tool outcomes into charts for `query`.
///
/// Error outcomes and malformed rows are skipped. No two returned charts
/// share a title fingerprint.
pub fn normalize(outcomes: &[ToolOutcome], query: &str) -> Vec<ChartData> {
    let scope = QueryScope::new(query);

    // Metric label -> records, in first-appearance order.
    let mut indicators: Vec<(String, Vec<IndicatorRecord>)> = Vec::new();
    let mut partners: Vec<(String, Vec<PartnerRecord>)> = Vec::new();

    for outcome in outcomes {
        let Some(result) = outcome.result() else {
            continue;
        };
        for record in source::parse(&outcome.tool, result) {
            match record {
                SourceRecord::Indicator(r) => push_grouped(&mut indicators, r.metric.clone(), r),
                SourceRecord::Partner(r) => push_grouped(&mut partners, r.metric.clone(), r),
                SourceRecord::Unrecognized => {}
            }
        }
    }

    let candidates = indicators
        .iter()
        .filter_map(|(metric, records)| build::indicator_chart(metric, records, &scope))
        .chain(
            partners
                .iter()
                .filter_map(|(metric, records)| build::partner_chart(metric, records)),
        );

    let mut seen = HashSet::new();
    let mut charts = Vec::new();
    for chart in candidates {
        if chart.point_count() < MIN_CHART_POINTS {
            debug!(title = ?chart.title, "chart dropped: too few points");
            continue;
        }
        if let Some(fingerprint) = chart.fingerprint()
            && !seen.insert(fingerprint)
        {
            debug!(title = ?chart.title, "chart dropped: duplicate title");
            continue;
        }
        charts.push(chart);
    }

    debug!(outcomes = outcomes.len(), charts = charts.len(), "normalized");
    charts
}

fn push_grouped<T>(groups: &mut Vec<(String, Vec<T>)>, key: String, item: T) {
    match groups.iter_mut().find(|(k, _)| *k == key) {
        Some((_, items)) => items.push(item),
        None => groups.push((key, vec![item])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{ChartKind, XValue};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn imf_growth() -> Value {
        json!({
            "values": {"NGDP_RPCH": {
                "NGA": {"2024": 3.1, "2025": 3.0, "2026": 3.2},
                "GHA": {"2024": 2.9, "2025": 4.4, "2026": 4.8},
                "KEN": {"2024": 5.0, "2025": 5.0, "2026": 5.1}
            }},
            "countries": {
                "NGA": {"label": "Nigeria"},
                "GHA": {"label": "Ghana"},
                "KEN": {"label": "Kenya"}
            }
        })
    }

    #[test]
    fn nigeria_forecast_is_a_single_line() {
        let outcomes = vec![ToolOutcome::success("imf_weo_forecast", imf_growth())];
        let charts = normalize(
            &outcomes,
            "What's Nigeria's GDP growth forecast for 2024-2026?",
        );
        assert_eq!(charts.len(), 1);
        let chart = &charts[0];
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "Nigeria");
        let years: Vec<_> = chart.series[0].points.iter().map(|p| p.x.clone()).collect();
        assert_eq!(
            years,
            vec![XValue::Year(2024), XValue::Year(2025), XValue::Year(2026)]
        );
    }

    #[test]
    fn global_query_on_same_data_is_a_map() {
        let outcomes = vec![ToolOutcome::success("imf_weo_forecast", imf_growth())];
        let charts = normalize(&outcomes, "GDP growth across Africa on a map");
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::Map);
        assert_eq!(charts[0].reference_year, Some(2026));
        assert_eq!(charts[0].map_points.len(), 3);
    }

    #[test]
    fn errors_and_garbage_are_skipped() {
        let outcomes = vec![
            ToolOutcome::failure("worldbank_indicator", "HTTP 500"),
            ToolOutcome::success("owid_series", json!("not rows")),
            ToolOutcome::success("imf_weo_forecast", imf_growth()),
        ];
        let charts = normalize(&outcomes, "Nigeria growth");
        assert_eq!(charts.len(), 1);
    }

    #[test]
    fn single_point_charts_are_dropped() {
        let outcomes = vec![ToolOutcome::success(
            "owid_series",
            json!([{"entity": "Chile", "year": 2000, "co2": 3.9}]),
        )];
        assert!(normalize(&outcomes, "Chile co2").is_empty());
    }

    #[test]
    fn partners_become_a_bar_chart() {
        let rows: Vec<Value> = ["China", "India", "Spain", "World"]
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({"partnerDesc": p, "primaryValue": 1000.0 * (i + 1) as f64, "flowDesc": "Export"})
            })
            .collect();
        let outcomes = vec![ToolOutcome::success("comtrade_partners", json!({"data": rows}))];
        let charts = normalize(&outcomes, "Nigeria's top export partners");
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].title.as_deref(), Some("Export value (US$) by partner"));
        assert_eq!(charts[0].series[0].points.len(), 3);
    }

    #[test]
    fn same_titles_across_sources_are_deduplicated() {
        let wb = json!([{"page": 1}, [
            {"indicator": {"value": "GDP growth"}, "country": {"value": "Peru"},
             "countryiso3code": "PER", "date": "2020", "value": -11.0},
            {"indicator": {"value": "GDP growth"}, "country": {"value": "Peru"},
             "countryiso3code": "PER", "date": "2021", "value": 13.4}
        ]]);
        let owid = json!([
            {"entity": "Peru", "year": 2020, "value": -11.0, "indicator": "gdp  GROWTH "},
            {"entity": "Peru", "year": 2021, "value": 13.4, "indicator": "gdp  GROWTH "}
        ]);
        let outcomes = vec![
            ToolOutcome::success("worldbank_indicator", wb),
            ToolOutcome::success("owid_series", owid),
        ];
        let charts = normalize(&outcomes, "Peru growth");
        assert_eq!(charts.len(), 1);
    }

    proptest! {
        #[test]
        fn duplicated_outcomes_never_duplicate_titles(
            copies in 1usize..4,
            query in prop::sample::select(vec![
                "Nigeria growth",
                "growth by country",
                "map of growth",
                "",
            ]),
        ) {
            let base = vec![
                ToolOutcome::success("imf_weo_forecast", imf_growth()),
                ToolOutcome::success("owid_series", json!([
                    {"entity": "Chile", "year": 2000, "co2": 3.9},
                    {"entity": "Chile", "year": 2001, "co2": 4.1}
                ])),
            ];
            let outcomes: Vec<ToolOutcome> =
                base.iter().cycle().take(base.len() * copies).cloned().collect();

            let charts = normalize(&outcomes, query);
            let mut titles: Vec<_> = charts.iter().filter_map(ChartData::fingerprint).collect();
            let total = titles.len();
            titles.sort();
            titles.dedup();
            prop_assert_eq!(titles.len(), total);
            prop_assert_eq!(charts.len(), normalize(&base, query).len());
        }
    }
}
