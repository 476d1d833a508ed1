// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field probing over loosely-typed JSON rows.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Keys that may hold an entity (country, area) name.
pub const ENTITY_KEYS: &[&str] = &[
    "entity",
    "Entity",
    "country",
    "Country",
    "country_name",
    "countryName",
    "Area",
    "area",
    "location",
    "name",
];

/// Keys that may hold an ISO-3 code.
pub const ISO_KEYS: &[&str] = &[
    "countryiso3code",
    "iso3",
    "iso_code",
    "iso3code",
    "country_code",
    "code",
    "Code",
    "Area Code (ISO3)",
];

/// Keys that may hold the observation year.
pub const YEAR_KEYS: &[&str] = &["year", "Year", "date", "period", "time", "TIME_PERIOD"];

/// Numeric keys that say nothing about what was measured.
pub const GENERIC_VALUE_KEYS: &[&str] = &["value", "Value", "obs_value", "OBS_VALUE", "val"];

/// Keys that may name the measured indicator.
pub const LABEL_KEYS: &[&str] = &["indicator_name", "indicator", "label", "series", "metric"];

/// Numeric keys that are identifiers rather than measurements.
const ID_KEYS: &[&str] = &["id", "page", "pages", "per_page", "total", "decimal", "rank"];

/// Envelope keys under which rows are commonly nested.
const ROW_CONTAINERS: &[&str] = &["data", "records", "rows", "observations", "results"];

static YEAR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4})").unwrap_or_else(|_| unreachable!()));

/// Locate the row array inside a tool result.
///
/// Accepts a bare array, a `[meta, rows]` pair, or an object with rows
/// under one of the usual envelope keys.
pub fn rows(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => {
            if items.len() == 2
                && items[0].is_object()
                && let Value::Array(inner) = &items[1]
            {
                return inner;
            }
            items
        }
        Value::Object(map) => ROW_CONTAINERS
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::Array(inner)) => Some(rows_of_array(inner)),
                _ => None,
            })
            .unwrap_or(&[]),
        _ => &[],
    }
}

fn rows_of_array(items: &[Value]) -> &[Value] {
    if items.len() == 2
        && items[0].is_object()
        && let Value::Array(inner) = &items[1]
    {
        return inner;
    }
    items
}

/// Parse a year from a number or a string starting with four digits.
pub fn year_of(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok())?,
        Value::String(s) => YEAR_PREFIX.captures(s)?.get(1)?.as_str().parse().ok()?,
        _ => return None,
    };
    (1800..=2200).contains(&year).then_some(year)
}

/// A measurement value: a JSON number or a numeric string. `null` is `Some(None)`.
pub fn measurement(value: &Value) -> Option<Option<f64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Some),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        _ => None,
    }
}

/// Text of a string field, or of `{ "value": "..." }` (World Bank style).
pub fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim()),
        Value::Object(map) => map.get("value").and_then(text_of),
        _ => None,
    }
}

pub fn first_text<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| row.get(*k).and_then(text_of))
}

pub fn first_year(row: &Map<String, Value>, keys: &[&str]) -> Option<i32> {
    keys.iter().find_map(|k| row.get(*k).and_then(year_of))
}

/// Key/value of the single measurement field in a row, if exactly one exists.
///
/// Only JSON numbers count, excluding year, ISO, entity and identifier keys.
/// A row whose only candidate is a `null` generic value key yields that key
/// with no value.
pub fn sole_numeric(row: &Map<String, Value>) -> Option<(&str, Option<f64>)> {
    let skip = |k: &str| {
        YEAR_KEYS.contains(&k)
            || ISO_KEYS.contains(&k)
            || ENTITY_KEYS.contains(&k)
            || ID_KEYS.contains(&k)
    };

    let mut numeric = row
        .iter()
        .filter(|(k, v)| !skip(k) && v.is_number())
        .filter_map(|(k, v)| v.as_f64().filter(|x| x.is_finite()).map(|x| (k.as_str(), x)));

    match (numeric.next(), numeric.next()) {
        (Some((key, v)), None) => Some((key, Some(v))),
        (Some(_), Some(_)) => None,
        (None, _) => GENERIC_VALUE_KEYS
            .iter()
            .find(|k| row.get(**k).is_some_and(Value::is_null))
            .map(|k| (*k, None)),
    }
}

/// ISO-3 code from the first ISO key holding a 3-letter uppercase code.
pub fn iso_code(row: &Map<String, Value>) -> Option<String> {
    ISO_KEYS.iter().find_map(|k| {
        let code = row.get(*k).and_then(text_of)?;
        (code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())).then(|| code.to_string())
    })
}
