//! Comparison engine
//!
//! Loads two race variants, inner-joins them on `bin` and derives the signed
//! per-bin difference `B - A` for the active metric. Nothing here is cached:
//! each call reads its own two files and returns an owned result.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CompareError, CompareResult, Notice, Side};
use crate::profile::{self, BinRow, RaceVariant};

/// Comparison measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Absolute distance per bin (km)
    #[default]
    Distance,
    /// Share of the race total per bin (%)
    Percentage,
}

impl Metric {
    /// Normalized CSV column holding this metric
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Distance => "distance_km",
            Metric::Percentage => "percentage",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Distance => "km",
            Metric::Percentage => "%",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Distance => "Distance (km)",
            Metric::Percentage => "Percentage (%)",
        }
    }
}

/// One side of a comparison: an event and one of its variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub event: String,
    pub variant: String,
}

impl Selection {
    pub fn new(event: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            variant: variant.into(),
        }
    }

    /// Reject identifiers the scanner could never have produced
    fn validate(&self, side: Side) -> CompareResult<()> {
        for (what, value) in [("event", &self.event), ("variant", &self.variant)] {
            let bad = value.is_empty()
                || value == "."
                || value == ".."
                || value.chars().any(std::path::is_separator);
            if bad {
                return Err(CompareError::InvalidSelection {
                    side,
                    reason: format!("{} name '{}' is not a data file name", what, value),
                });
            }
        }
        Ok(())
    }

    fn load(&self, root: &Path, extension: &str, side: Side, metric: Metric) -> CompareResult<RaceVariant> {
        self.validate(side)?;
        let path = profile::variant_path(root, &self.event, &self.variant, extension);
        let rows = profile::load_rows(&path, side, metric)?;
        Ok(RaceVariant {
            event: self.event.clone(),
            variant: self.variant.clone(),
            rows,
        })
    }
}

/// One joined bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub bin: String,
    /// Race A's sort key; rows are ordered by it
    pub sort: f64,
    pub value_a: Option<f64>,
    pub value_b: Option<f64>,
    /// `value_b - value_a`; undefined when either side is missing
    pub delta: Option<f64>,
}

/// Result of one comparison request
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub metric: Metric,
    pub a: RaceVariant,
    pub b: RaceVariant,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// No shared bins survived the join
    pub fn is_disjoint(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.is_disjoint().then_some(Notice::JoinMismatch)
    }

    /// Largest metric value across both full sides, 0 when none is defined
    pub fn max_value(&self) -> f64 {
        self.a
            .rows
            .iter()
            .chain(self.b.rows.iter())
            .filter_map(|row| row.value(self.metric))
            .fold(0.0, f64::max)
    }
}

/// Compare two variants under `root`
pub fn compare(
    root: &Path,
    extension: &str,
    a: &Selection,
    b: &Selection,
    metric: Metric,
) -> CompareResult<Comparison> {
    tracing::debug!(
        "Comparing {}/{} vs {}/{} on {}",
        a.event,
        a.variant,
        b.event,
        b.variant,
        metric.column()
    );

    let a = a.load(root, extension, Side::A, metric)?;
    let b = b.load(root, extension, Side::B, metric)?;
    let rows = join(&a.rows, &b.rows, metric);

    if rows.is_empty() {
        tracing::warn!(
            "{}/{} and {}/{} share no bins",
            a.event,
            a.variant,
            b.event,
            b.variant
        );
    } else {
        tracing::debug!("Joined {} bins", rows.len());
    }

    Ok(Comparison { metric, a, b, rows })
}

/// Inner join on `bin`, keeping A's order
pub fn join(a: &[BinRow], b: &[BinRow], metric: Metric) -> Vec<ComparisonRow> {
    let b_by_bin: HashMap<&str, &BinRow> = b.iter().map(|row| (row.bin.as_str(), row)).collect();

    a.iter()
        .filter_map(|row_a| {
            let row_b = b_by_bin.get(row_a.bin.as_str())?;
            let value_a = row_a.value(metric);
            let value_b = row_b.value(metric);
            Some(ComparisonRow {
                bin: row_a.bin.clone(),
                sort: row_a.sort,
                value_a,
                value_b,
                delta: value_a.zip(value_b).map(|(va, vb)| vb - va),
            })
        })
        .collect()
}
