//! Column statistics over parsed rows.
//!
//! For each column: how many cells are filled, and, when at least one value
//! reads as a number, the min / max / mean of the numeric subset. Numbers are
//! read with leading-prefix semantics: `"12 units"` counts as 12, `"n/a"`
//! does not count at all. Mixed columns are numeric as soon as one value
//! parses.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Leading float literal: optional sign, then `Infinity` or digits with an
/// optional fraction and exponent.
static FLOAT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("float prefix regex must compile")
});

/// Statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    /// Non-empty cells.
    pub total_values: usize,
    pub empty_values: usize,
    pub is_numeric: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Whole-dataset summary shown above the per-column table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_columns: usize,
    pub total_rows: usize,
    pub filled_cells: usize,
    /// Filled cells as a percentage of all cells (0 when there are none).
    pub completeness: f64,
    pub numeric_columns: usize,
}

/// Read the leading numeric prefix of a cell, if there is one.
pub fn parse_float_prefix(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let literal = FLOAT_PREFIX_RE.find(trimmed)?.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => literal.parse().ok(),
    }
}

/// Compute per-column statistics.
///
/// `rows` may be the preview or the full row set; cells beyond a row's end
/// count as empty.
pub fn column_stats(headers: &[String], rows: &[Vec<String>]) -> Vec<ColumnStats> {
    headers
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let filled: Vec<&str> = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();
            let numbers: Vec<f64> = filled.iter().filter_map(|c| parse_float_prefix(c)).collect();

            let (min, max, avg) = if numbers.is_empty() {
                (None, None, None)
            } else {
                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = numbers.iter().sum::<f64>() / numbers.len() as f64;
                (Some(min), Some(max), Some(avg))
            };

            ColumnStats {
                name: name.clone(),
                total_values: filled.len(),
                empty_values: rows.len() - filled.len(),
                is_numeric: !numbers.is_empty(),
                min,
                max,
                avg,
            }
        })
        .collect()
}

/// Summarize column statistics over `row_count` rows.
pub fn overview(stats: &[ColumnStats], row_count: usize) -> DatasetOverview {
    let filled_cells: usize = stats.iter().map(|s| s.total_values).sum();
    let total_cells = stats.len() * row_count;
    let completeness = if total_cells == 0 {
        0.0
    } else {
        (filled_cells as f64 / total_cells as f64) * 100.0
    };

    DatasetOverview {
        total_columns: stats.len(),
        total_rows: row_count,
        filled_cells,
        completeness,
        numeric_columns: stats.iter().filter(|s| s.is_numeric).count(),
    }
}
