// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chart construction from parsed records.

use std::collections::{BTreeMap, BTreeSet};

use meridian_core::{AxisLabels, ChartData, ChartKind, ChartPoint, ChartSeries, MapPoint, XValue};
use tracing::debug;

use crate::query::QueryScope;
use crate::source::{IndicatorRecord, PartnerRecord};

/// Partner charts keep only the largest partners.
pub const MAX_PARTNERS: usize = 10;

/// Build one chart from all records of a single metric.
pub fn indicator_chart(
    metric: &str,
    records: &[IndicatorRecord],
    scope: &QueryScope,
) -> Option<ChartData> {
    let records = filter_entities(records, scope);
    let entities = distinct_entities(&records);
    if entities.is_empty() {
        return None;
    }

    if scope.wants_map() && entities.len() > 1 {
        return map_chart(metric, &records);
    }

    let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
    if entities.len() > 1 && years.len() <= 2 {
        Some(bar_by_entity(metric, &records, &entities, &years))
    } else {
        Some(line_by_year(metric, &records, &entities))
    }
}

/// Keep records for entities the query names, unless the query is global
/// or names none of them.
fn filter_entities<'a>(
    records: &'a [IndicatorRecord],
    scope: &QueryScope,
) -> Vec<&'a IndicatorRecord> {
    if scope.is_global() {
        return records.iter().collect();
    }
    let named: Vec<&IndicatorRecord> = records
        .iter()
        .filter(|r| scope.names_entity(&r.entity))
        .collect();
    if named.is_empty() {
        records.iter().collect()
    } else {
        named
    }
}

/// Entity names in first-appearance order.
fn distinct_entities<'a>(records: &[&'a IndicatorRecord]) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .map(|r| r.entity.as_str())
        .filter(|e| seen.insert(*e))
        .collect()
}

fn map_chart(metric: &str, records: &[&IndicatorRecord]) -> Option<ChartData> {
    let year = records
        .iter()
        .filter(|r| r.value.is_some())
        .map(|r| r.year)
        .max()?;

    let mut seen = BTreeSet::new();
    let points: Vec<MapPoint> = records
        .iter()
        .filter(|r| r.year == year && r.value.is_some())
        .filter(|r| seen.insert(r.entity.as_str()))
        .map(|r| MapPoint {
            entity: r.entity.clone(),
            iso_code: r.iso_code.clone(),
            value: r.value,
        })
        .collect();

    debug!(metric, year, entities = points.len(), "map chart");
    Some(ChartData::map(format!("{metric}, {year}"), year, points))
}

/// One series per year, one bar per entity.
fn bar_by_entity(
    metric: &str,
    records: &[&IndicatorRecord],
    entities: &[&str],
    years: &BTreeSet<i32>,
) -> ChartData {
    let series = years
        .iter()
        .map(|year| ChartSeries {
            name: year.to_string(),
            points: entities
                .iter()
                .map(|entity| ChartPoint {
                    x: XValue::Category((*entity).to_string()),
                    y: records
                        .iter()
                        .find(|r| r.year == *year && r.entity == *entity)
                        .and_then(|r| r.value),
                })
                .collect(),
        })
        .collect();

    ChartData::series_chart(
        ChartKind::Bar,
        metric,
        series,
        AxisLabels {
            x: "Country".to_string(),
            y: metric.to_string(),
        },
    )
}

/// One series per entity over sorted years.
fn line_by_year(metric: &str, records: &[&IndicatorRecord], entities: &[&str]) -> ChartData {
    let series = entities
        .iter()
        .map(|entity| {
            // First observation per year wins.
            let mut by_year: BTreeMap<i32, Option<f64>> = BTreeMap::new();
            for record in records.iter().filter(|r| r.entity == *entity) {
                by_year.entry(record.year).or_insert(record.value);
            }
            ChartSeries {
                name: (*entity).to_string(),
                points: by_year
                    .into_iter()
                    .map(|(year, y)| ChartPoint {
                        x: XValue::Year(year),
                        y,
                    })
                    .collect(),
            }
        })
        .collect();

    ChartData::series_chart(
        ChartKind::Line,
        metric,
        series,
        AxisLabels {
            x: "Year".to_string(),
            y: metric.to_string(),
        },
    )
}

/// Top partners by value, always a bar chart.
pub fn partner_chart(metric: &str, records: &[PartnerRecord]) -> Option<ChartData> {
    let mut sorted: Vec<&PartnerRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut seen = BTreeSet::new();
    let points: Vec<ChartPoint> = sorted
        .into_iter()
        .filter(|r| seen.insert(r.partner.as_str()))
        .take(MAX_PARTNERS)
        .map(|r| ChartPoint {
            x: XValue::Category(r.partner.clone()),
            y: Some(r.value),
        })
        .collect();
    if points.is_empty() {
        return None;
    }

    Some(ChartData::series_chart(
        ChartKind::Bar,
        format!("{metric} by partner"),
        vec![ChartSeries {
            name: metric.to_string(),
            points,
        }],
        AxisLabels {
            x: "Partner".to_string(),
            y: metric.to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, year: i32, value: Option<f64>) -> IndicatorRecord {
        IndicatorRecord {
            metric: "GDP growth".into(),
            entity: entity.into(),
            iso_code: None,
            year,
            value,
        }
    }

    #[test]
    fn single_entity_is_a_line_with_sorted_years() {
        let records = vec![
            record("Ghana", 2022, Some(3.0)),
            record("Ghana", 2020, Some(0.5)),
            record("Ghana", 2021, None),
            record("Ghana", 2020, Some(9.9)),
        ];
        let chart =
            indicator_chart("GDP growth", &records, &QueryScope::new("Ghana growth")).unwrap();
        assert_eq!(chart.kind, ChartKind::Line);
        let years: Vec<_> = chart.series[0].points.iter().map(|p| p.x.clone()).collect();
        assert_eq!(
            years,
            vec![XValue::Year(2020), XValue::Year(2021), XValue::Year(2022)]
        );
        assert_eq!(chart.series[0].points[0].y, Some(0.5));
        assert_eq!(chart.axis_labels.unwrap().x, "Year");
    }

    #[test]
    fn several_entities_few_years_is_a_bar() {
        let records = vec![
            record("Kenya", 2023, Some(5.0)),
            record("Uganda", 2023, Some(4.0)),
            record("Tanzania", 2023, Some(6.0)),
        ];
        let chart = indicator_chart(
            "GDP growth",
            &records,
            &QueryScope::new("compare east african growth"),
        )
        .unwrap();
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "2023");
        assert_eq!(chart.series[0].points.len(), 3);
    }

    #[test]
    fn map_uses_latest_year_with_values() {
        let records = vec![
            record("Kenya", 2022, Some(5.0)),
            record("Kenya", 2023, Some(5.5)),
            record("Uganda", 2023, Some(4.0)),
            record("Uganda", 2024, None),
        ];
        let chart =
            indicator_chart("GDP growth", &records, &QueryScope::new("world growth map")).unwrap();
        assert_eq!(chart.kind, ChartKind::Map);
        assert_eq!(chart.reference_year, Some(2023));
        assert_eq!(chart.map_points.len(), 2);
        assert!(chart.series.is_empty());
    }

    #[test]
    fn map_needs_more_than_one_entity() {
        let records = vec![record("Kenya", 2022, Some(5.0)), record("Kenya", 2023, Some(5.5))];
        let chart =
            indicator_chart("GDP growth", &records, &QueryScope::new("map of Kenya")).unwrap();
        assert_eq!(chart.kind, ChartKind::Line);
    }

    #[test]
    fn partners_sorted_and_capped() {
        let records: Vec<PartnerRecord> = (0..15)
            .map(|i| PartnerRecord {
                metric: "Export value (US$)".into(),
                partner: format!("P{i}"),
                value: f64::from(i),
            })
            .collect();
        let chart = partner_chart("Export value (US$)", &records).unwrap();
        assert_eq!(chart.kind, ChartKind::Bar);
        let points = &chart.series[0].points;
        assert_eq!(points.len(), MAX_PARTNERS);
        assert_eq!(points[0].x, XValue::Category("P14".into()));
        assert_eq!(points[9].y, Some(5.0));
    }
}
