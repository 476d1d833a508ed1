// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source recognition and per-source record parsing.
//!
//! Each data source returns its own shape. Parsing turns a tool result into
//! a flat list of [`SourceRecord`]s; rows that do not fit are skipped one by
//! one rather than failing the whole result.

use serde_json::{Map, Value};
use tracing::debug;

use crate::probe::{
    first_text, first_year, iso_code, measurement, rows, sole_numeric, text_of, year_of,
    ENTITY_KEYS, GENERIC_VALUE_KEYS, LABEL_KEYS, YEAR_KEYS,
};

/// Data source, recognized from the tool-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    WorldBank,
    Imf,
    Faostat,
    Comtrade,
    Owid,
    Unrecognized,
}

impl SourceKind {
    pub fn from_tool_name(tool: &str) -> Self {
        const PREFIXES: &[(&str, SourceKind)] = &[
            ("worldbank_", SourceKind::WorldBank),
            ("imf_", SourceKind::Imf),
            ("faostat_", SourceKind::Faostat),
            ("comtrade_", SourceKind::Comtrade),
            ("owid_", SourceKind::Owid),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| tool.starts_with(prefix))
            .map_or(SourceKind::Unrecognized, |(_, kind)| *kind)
    }
}

/// One entity/year observation of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRecord {
    pub metric: String,
    pub entity: String,
    pub iso_code: Option<String>,
    pub year: i32,
    pub value: Option<f64>,
}

/// One trading partner's value for a flow.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRecord {
    pub metric: String,
    pub partner: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Indicator(IndicatorRecord),
    Partner(PartnerRecord),
    /// A row that matched no known shape.
    Unrecognized,
}

/// Parse every record in one successful tool result.
pub fn parse(tool: &str, value: &Value) -> Vec<SourceRecord> {
    let kind = SourceKind::from_tool_name(tool);
    let records: Vec<SourceRecord> = match kind {
        SourceKind::Imf if value.get("values").is_some_and(Value::is_object) => {
            parse_imf_nested(value)
        }
        SourceKind::Comtrade => rows(value).iter().map(parse_partner_row).collect(),
        _ => rows(value)
            .iter()
            .map(|row| parse_row(kind, tool, row))
            .collect(),
    };

    let skipped = records
        .iter()
        .filter(|r| matches!(r, SourceRecord::Unrecognized))
        .count();
    if skipped > 0 {
        debug!(tool, ?kind, skipped, total = records.len(), "rows skipped");
    }
    records
}

fn parse_row(kind: SourceKind, tool: &str, row: &Value) -> SourceRecord {
    let Some(row) = row.as_object() else {
        return SourceRecord::Unrecognized;
    };
    let parsed = match kind {
        SourceKind::WorldBank => parse_worldbank_row(row),
        SourceKind::Faostat => parse_faostat_row(row),
        _ => None,
    };
    parsed
        .or_else(|| parse_generic_row(tool, row))
        .map_or(SourceRecord::Unrecognized, SourceRecord::Indicator)
}

/// `{country: {value}, countryiso3code, date, value, indicator: {value}}`
fn parse_worldbank_row(row: &Map<String, Value>) -> Option<IndicatorRecord> {
    let entity = row.get("country").and_then(text_of)?;
    let year = first_year(row, &["date"])?;
    let value = measurement(row.get("value")?)?;
    let metric = row.get("indicator").and_then(text_of)?;
    Some(IndicatorRecord {
        metric: metric.to_string(),
        entity: entity.to_string(),
        iso_code: iso_code(row),
        year,
        value,
    })
}

/// `{Area, Year, Value, Item, Element, Unit}`
fn parse_faostat_row(row: &Map<String, Value>) -> Option<IndicatorRecord> {
    let entity = first_text(row, &["Area", "area"])?;
    let year = first_year(row, &["Year", "year"])?;
    let value = measurement(row.get("Value").or_else(|| row.get("value"))?)?;

    let item = first_text(row, &["Item", "item"]);
    let element = first_text(row, &["Element", "element"]);
    let mut metric = match (item, element) {
        (Some(item), Some(element)) => format!("{item} {}", element.to_lowercase()),
        (Some(label), None) | (None, Some(label)) => label.to_string(),
        (None, None) => return None,
    };
    if let Some(unit) = first_text(row, &["Unit", "unit"]) {
        metric = format!("{metric} ({unit})");
    }

    Some(IndicatorRecord {
        metric,
        entity: entity.to_string(),
        iso_code: iso_code(row),
        year,
        value,
    })
}

/// Entity + year + exactly one other numeric field.
fn parse_generic_row(tool: &str, row: &Map<String, Value>) -> Option<IndicatorRecord> {
    let entity = first_text(row, ENTITY_KEYS)?;
    let year = first_year(row, YEAR_KEYS)?;

    let (key, value) = match sole_numeric(row) {
        Some(found) => found,
        // Numeric strings under a generic key ("value": "3.1").
        None => GENERIC_VALUE_KEYS
            .iter()
            .find_map(|k| Some((*k, measurement(row.get(*k)?)?)))?,
    };

    let metric = if GENERIC_VALUE_KEYS.contains(&key) {
        first_text(row, LABEL_KEYS).unwrap_or(tool).to_string()
    } else {
        key.to_string()
    };

    Some(IndicatorRecord {
        metric,
        entity: entity.to_string(),
        iso_code: iso_code(row),
        year,
        value,
    })
}

/// `{partnerDesc, primaryValue, flowDesc}`; the "World" aggregate is dropped.
fn parse_partner_row(row: &Value) -> SourceRecord {
    let Some(row) = row.as_object() else {
        return SourceRecord::Unrecognized;
    };
    let partner = first_text(row, &["partnerDesc", "partner"]);
    let value = row
        .get("primaryValue")
        .or_else(|| row.get("value"))
        .and_then(measurement)
        .flatten();

    match (partner, value) {
        (Some(partner), Some(value)) if !partner.eq_ignore_ascii_case("world") => {
            let flow = first_text(row, &["flowDesc", "flow"]).unwrap_or("Trade");
            SourceRecord::Partner(PartnerRecord {
                metric: format!("{flow} value (US$)"),
                partner: partner.to_string(),
                value,
            })
        }
        _ => SourceRecord::Unrecognized,
    }
}

/// IMF DataMapper: `values.{indicator}.{iso}.{year} = number`.
fn parse_imf_nested(value: &Value) -> Vec<SourceRecord> {
    let Some(indicators) = value.get("values").and_then(Value::as_object) else {
        return Vec::new();
    };
    let labels = value.get("countries").and_then(Value::as_object);

    let mut records = Vec::new();
    for (indicator, by_country) in indicators {
        let Some(by_country) = by_country.as_object() else {
            records.push(SourceRecord::Unrecognized);
            continue;
        };
        let metric = imf_label(indicator);
        for (iso, by_year) in by_country {
            let entity = labels
                .and_then(|l| l.get(iso))
                .and_then(|c| c.get("label"))
                .and_then(text_of)
                .unwrap_or(iso);
            let Some(by_year) = by_year.as_object() else {
                records.push(SourceRecord::Unrecognized);
                continue;
            };
            for (year, observation) in by_year {
                let parsed = year_of(&Value::String(year.clone()))
                    .zip(measurement(observation));
                records.push(match parsed {
                    Some((year, value)) => SourceRecord::Indicator(IndicatorRecord {
                        metric: metric.clone(),
                        entity: entity.to_string(),
                        iso_code: Some(iso.clone()),
                        year,
                        value,
                    }),
                    None => SourceRecord::Unrecognized,
                });
            }
        }
    }
    records
}

/// Human label for common WEO indicator codes.
fn imf_label(code: &str) -> String {
    let label = match code {
        "NGDP_RPCH" => "Real GDP growth (%)",
        "PCPIPCH" => "Inflation, average consumer prices (%)",
        "LUR" => "Unemployment rate (%)",
        "GGXWDG_NGDP" => "General government gross debt (% of GDP)",
        "BCA_NGDPD" => "Current account balance (% of GDP)",
        "NGDPD" => "GDP, current prices (billions of US$)",
        "NGDPDPC" => "GDP per capita, current prices (US$)",
        other => other,
    };
    label.to_string()
}
