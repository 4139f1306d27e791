//! Tornado chart model
//!
//! Lays out the mirrored bar chart for a comparison: Race A grows left,
//! Race B grows right, and a signed delta label sits in a column on the far
//! right. Produces data only; drawing is left to whoever consumes the JSON.

use serde::Serialize;
use std::fmt::Write;

use crate::compare::{Comparison, Metric};
use crate::config::Config;
use crate::profile::RaceVariant;

/// How a delta label is coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaTone {
    /// Within the threshold either way
    Neutral,
    /// Race A has more in this bin
    AExceeds,
    /// Race B has more in this bin
    BExceeds,
    /// One side has no value
    Undefined,
}

impl DeltaTone {
    pub fn classify(delta: Option<f64>, threshold: f64) -> Self {
        match delta {
            None => DeltaTone::Undefined,
            Some(d) if d.is_nan() => DeltaTone::Undefined,
            Some(d) if d.abs() <= threshold => DeltaTone::Neutral,
            Some(d) if d > 0.0 => DeltaTone::BExceeds,
            Some(_) => DeltaTone::AExceeds,
        }
    }

    pub fn color<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            DeltaTone::Neutral | DeltaTone::Undefined => &config.colors.neutral,
            DeltaTone::AExceeds => &config.colors.a_exceeds,
            DeltaTone::BExceeds => &config.colors.b_exceeds,
        }
    }
}

/// Bar label: one decimal, blank for empty bins
pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{:.1}{}", v, unit),
        _ => String::new(),
    }
}

/// Delta label: one decimal with an explicit `+` for gains
pub fn format_delta(delta: Option<f64>, unit: &str) -> String {
    match delta {
        Some(d) if d > 0.0 => format!("+{:.1}{}", d, unit),
        Some(d) => format!("{:.1}{}", d, unit),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub bin: String,
    /// Signed bar length (negative for the left side)
    pub x: f64,
    pub base: f64,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaLabel {
    pub bin: String,
    pub text: String,
    pub tone: DeltaTone,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TornadoChart {
    pub title_a: String,
    pub title_b: String,
    pub metric: Metric,
    pub unit: &'static str,
    pub left: Vec<Bar>,
    pub right: Vec<Bar>,
    pub deltas: Vec<DeltaLabel>,
    pub heading: &'static str,
    /// x of the delta column
    pub annotation_x: f64,
    pub x_range: [f64; 2],
}

impl TornadoChart {
    pub fn build(comparison: &Comparison, config: &Config) -> Self {
        let metric = comparison.metric;
        let unit = metric.unit();
        let max_val = comparison.max_value();
        let axis_range = max_val * config.axis_headroom;
        let gap = max_val * config.bar_gap;

        let palette: Vec<&str> = config.palette.iter().rev().map(String::as_str).collect();
        let bars = |side: &RaceVariant, sign: f64| -> Vec<Bar> {
            side.rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let value = row.value(metric);
                    Bar {
                        bin: row.bin.clone(),
                        x: sign * value.unwrap_or(0.0),
                        base: sign * gap,
                        label: format_value(value, unit),
                        color: palette
                            .get(i % palette.len().max(1))
                            .copied()
                            .unwrap_or("gray")
                            .to_string(),
                    }
                })
                .collect()
        };

        let deltas = comparison
            .rows
            .iter()
            .map(|row| {
                let tone = DeltaTone::classify(row.delta, config.delta_threshold);
                DeltaLabel {
                    bin: row.bin.clone(),
                    text: format_delta(row.delta, unit),
                    tone,
                    color: tone.color(config).to_string(),
                }
            })
            .collect();

        TornadoChart {
            title_a: format!("{} {}", comparison.a.event, comparison.a.variant),
            title_b: format!("{} {}", comparison.b.event, comparison.b.variant),
            metric,
            unit,
            left: bars(&comparison.a, -1.0),
            right: bars(&comparison.b, 1.0),
            deltas,
            heading: "Race B has:",
            annotation_x: axis_range * 0.88,
            x_range: [-axis_range * 0.8, axis_range],
        }
    }
}

/// Plain-text rendering for the terminal
pub fn render_table(chart: &TornadoChart) -> String {
    let width = chart
        .left
        .iter()
        .chain(chart.right.iter())
        .map(|bar| bar.bin.len())
        .max()
        .unwrap_or(3)
        .max(3);

    let mut out = String::new();
    let _ = writeln!(out, "A: {}", chart.title_a);
    let _ = writeln!(out, "B: {}", chart.title_b);
    let _ = writeln!(out, "Metric: {}", chart.metric.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>10}  {:^width$}  {:<10}  {}", "A", "Bin", "B", chart.heading);

    for delta in &chart.deltas {
        let label = |bars: &[Bar]| {
            bars.iter()
                .find(|bar| bar.bin == delta.bin)
                .map(|bar| bar.label.clone())
                .unwrap_or_default()
        };
        let _ = writeln!(
            out,
            "{:>10}  {:^width$}  {:<10}  {}",
            label(chart.left.as_slice()),
            delta.bin,
            label(chart.right.as_slice()),
            delta.text
        );
    }
    out
}
