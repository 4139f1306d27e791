//! Race profile loader
//!
//! One CSV per race variant, one row per grade bin. Producers are sloppy about
//! headers (`" Bin "`, `Distance_km`), so column lookup trims and ignores case.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::compare::Metric;
use crate::error::{CompareError, CompareResult, Side};

pub const BIN_COLUMN: &str = "bin";
pub const SORT_COLUMN: &str = "sort";

/// One grade/elevation bucket of a race profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRow {
    pub bin: String,
    pub sort: f64,
    pub distance_km: Option<f64>,
    pub percentage: Option<f64>,
}

impl BinRow {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Distance => self.distance_km,
            Metric::Percentage => self.percentage,
        }
    }
}

/// A loaded variant, rows ascending by `sort`
#[derive(Debug, Clone, Serialize)]
pub struct RaceVariant {
    pub event: String,
    pub variant: String,
    pub rows: Vec<BinRow>,
}

/// Path of a variant's data file; inverse of the catalog scanner's naming
pub fn variant_path(root: &Path, event: &str, variant: &str, extension: &str) -> PathBuf {
    root.join(event).join(format!("{}.{}", variant, extension))
}

/// Column positions after header normalization
struct Columns {
    bin: usize,
    sort: usize,
    distance_km: Option<usize>,
    percentage: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, side: Side, path: &Path, metric: Metric) -> CompareResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let require = |name: &str| find(name).ok_or_else(|| CompareError::schema(side, path, name));

        let columns = Columns {
            bin: require(BIN_COLUMN)?,
            sort: require(SORT_COLUMN)?,
            distance_km: find(Metric::Distance.column()),
            percentage: find(Metric::Percentage.column()),
        };
        if columns.metric(metric).is_none() {
            return Err(CompareError::schema(side, path, metric.column()));
        }
        Ok(columns)
    }

    fn metric(&self, metric: Metric) -> Option<usize> {
        match metric {
            Metric::Distance => self.distance_km,
            Metric::Percentage => self.percentage,
        }
    }
}

/// Load one variant file, validated for `metric`, sorted by `sort`
pub fn load_rows(path: &Path, side: Side, metric: Metric) -> CompareResult<Vec<BinRow>> {
    tracing::debug!("{}: loading {:?} for {}", side, path, metric.column());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CompareError::data_load(side, path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| CompareError::data_load(side, path, e))?
        .clone();
    let columns = Columns::locate(&headers, side, path, metric)?;

    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let record = record.map_err(|e| CompareError::data_load(side, path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let bin = cell(columns.bin).to_string();
        if !seen.insert(bin.clone()) {
            return Err(CompareError::DuplicateBin {
                side,
                path: path.to_path_buf(),
                bin,
            });
        }

        let sort_raw = cell(columns.sort);
        let sort: f64 = sort_raw.parse().map_err(|_| {
            CompareError::data_load(
                side,
                path,
                format!("line {}: sort value '{}' is not numeric", line, sort_raw),
            )
        })?;

        let mut row = BinRow {
            bin,
            sort,
            distance_km: None,
            percentage: None,
        };
        for m in [Metric::Distance, Metric::Percentage] {
            let Some(idx) = columns.metric(m) else { continue };
            let raw = cell(idx);
            let value = match parse_metric(raw) {
                Some(v) => v,
                // Only the active metric has to be well formed
                None if m == metric => {
                    return Err(CompareError::data_load(
                        side,
                        path,
                        format!("line {}: {} value '{}' is not numeric", line, m.column(), raw),
                    ));
                }
                None => None,
            };
            match m {
                Metric::Distance => row.distance_km = value,
                Metric::Percentage => row.percentage = value,
            }
        }
        rows.push(row);
    }

    rows.sort_by(|a, b| a.sort.total_cmp(&b.sort));
    tracing::debug!("{}: {} bins loaded from {:?}", side, rows.len(), path);
    Ok(rows)
}

/// `Some(None)` for a missing value, `None` for a malformed or infinite one
fn parse_metric(raw: &str) -> Option<Option<f64>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Some(None),
        Ok(v) if v.is_finite() => Some(Some(v)),
        Ok(_) | Err(_) => None,
    }
}
