// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical chart representation returned alongside answers.
//!
//! A [`ChartData`] is either a series chart (`line`, `bar`) or a `map`.
//! The constructors keep `series` and `map_points` mutually exclusive.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Rendering kind of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Map,
}

/// X coordinate: a year on time axes, or a category label on bar charts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    Year(i32),
    Category(String),
}

/// One point in a series. Missing observations keep a `null` y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: XValue,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Number of points carrying a value.
    pub fn value_count(&self) -> usize {
        self.points.iter().filter(|p| p.y.is_some()).count()
    }
}

/// One entity's value on a map chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_code: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<ChartSeries>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_points: Vec<MapPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_labels: Option<AxisLabels>,
}

impl ChartData {
    /// A line or bar chart.
    ///
    /// A `Map` kind passed here is demoted to `Bar`; maps are built with
    /// [`ChartData::map`].
    pub fn series_chart(
        kind: ChartKind,
        title: impl Into<String>,
        series: Vec<ChartSeries>,
        axis_labels: AxisLabels,
    ) -> Self {
        let kind = if kind == ChartKind::Map {
            ChartKind::Bar
        } else {
            kind
        };
        Self {
            kind,
            series,
            map_points: Vec::new(),
            reference_year: None,
            title: Some(title.into()),
            axis_labels: Some(axis_labels),
        }
    }

    /// A single-year map chart.
    pub fn map(title: impl Into<String>, reference_year: i32, points: Vec<MapPoint>) -> Self {
        Self {
            kind: ChartKind::Map,
            series: Vec::new(),
            map_points: points,
            reference_year: Some(reference_year),
            title: Some(title.into()),
            axis_labels: None,
        }
    }

    /// Number of non-null data points carried by the chart.
    pub fn point_count(&self) -> usize {
        match self.kind {
            ChartKind::Map => self.map_points.iter().filter(|p| p.value.is_some()).count(),
            ChartKind::Line | ChartKind::Bar => {
                self.series.iter().map(ChartSeries::value_count).sum()
            }
        }
    }

    /// Normalized title used to deduplicate charts within one response.
    pub fn fingerprint(&self) -> Option<String> {
        self.title.as_deref().map(|title| {
            title
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
    }
}
