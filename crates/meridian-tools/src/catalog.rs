// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tool catalog.
//!
//! Names carry the source prefix the chart normalizer dispatches on:
//! `worldbank_`, `imf_`, `faostat_`, `comtrade_`, `owid_`.

use serde_json::{json, Value};

/// Static description of one data tool.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: fn() -> Value,
}

fn year_range() -> Value {
    json!({
        "start_year": { "type": "integer", "description": "First year (inclusive)" },
        "end_year": { "type": "integer", "description": "Last year (inclusive)" }
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    let mut merged = year_range();
    if let (Some(target), Some(extra)) = (merged.as_object_mut(), properties.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    json!({
        "type": "object",
        "properties": merged,
        "required": required,
    })
}

fn worldbank_indicator_schema() -> Value {
    object_schema(
        json!({
            "countries": {
                "type": "array",
                "items": { "type": "string" },
                "description": "ISO3 country codes, or [\"all\"] for every country"
            },
            "indicator": {
                "type": "string",
                "description": "World Bank indicator code, e.g. NY.GDP.MKTP.KD.ZG"
            }
        }),
        &["countries", "indicator"],
    )
}

fn worldbank_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Free-text indicator search" }
        },
        "required": ["query"]
    })
}

fn imf_forecast_schema() -> Value {
    object_schema(
        json!({
            "countries": {
                "type": "array",
                "items": { "type": "string" },
                "description": "ISO3 country codes"
            },
            "indicator": {
                "type": "string",
                "description": "WEO indicator code, e.g. NGDP_RPCH (real GDP growth), PCPIPCH (inflation), GGXWDG_NGDP (gross debt % GDP)"
            }
        }),
        &["countries", "indicator"],
    )
}

fn faostat_schema() -> Value {
    object_schema(
        json!({
            "areas": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Country or region names"
            },
            "item": { "type": "string", "description": "Commodity, e.g. Maize" },
            "element": {
                "type": "string",
                "description": "Measure: Production, Yield, or Area harvested"
            }
        }),
        &["areas", "item"],
    )
}

fn comtrade_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reporter": { "type": "string", "description": "Reporting country ISO3 code" },
            "flow": { "type": "string", "enum": ["import", "export"] },
            "year": { "type": "integer" },
            "commodity": { "type": "string", "description": "HS code, or TOTAL" }
        },
        "required": ["reporter", "flow"]
    })
}

fn owid_schema() -> Value {
    object_schema(
        json!({
            "dataset": {
                "type": "string",
                "description": "Our World in Data grapher slug, e.g. co2, life-expectancy"
            },
            "entities": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Entity names; omit for all"
            }
        }),
        &["dataset"],
    )
}

/// Every tool the external data service is expected to serve.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "worldbank_indicator",
        description: "Fetch annual World Bank development indicator values for one or more countries.",
        schema: worldbank_indicator_schema,
    },
    CatalogEntry {
        name: "worldbank_search_indicators",
        description: "Search World Bank indicator codes by keyword.",
        schema: worldbank_search_schema,
    },
    CatalogEntry {
        name: "imf_weo_forecast",
        description: "Fetch IMF World Economic Outlook historical values and forecasts by country.",
        schema: imf_forecast_schema,
    },
    CatalogEntry {
        name: "faostat_production",
        description: "Fetch FAOSTAT crop and livestock statistics (production, yield, area).",
        schema: faostat_schema,
    },
    CatalogEntry {
        name: "comtrade_partners",
        description: "Fetch a country's top trading partners by trade value from UN Comtrade.",
        schema: comtrade_schema,
    },
    CatalogEntry {
        name: "owid_series",
        description: "Fetch a long-run cross-country series from Our World in Data.",
        schema: owid_schema,
    },
];

/// Look up a catalog entry by tool name.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}
