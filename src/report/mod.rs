//! Result rendering: turn a classification summary into counts,
//! percentages, chart data, and a saved artifact.
//!
//! Percentages are always taken against `total_processed`, as the service
//! reports it. The two classes are not assumed to add up to that total; when
//! they don't, [`ResultView::partition_consistent`] is `false` and callers
//! warn instead of silently renormalizing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::classifier::AnalysisSummary;

/// Bar / pie color for the complaint class.
pub const COMPLAINT_COLOR: &str = "#ef4444";
/// Bar / pie color for the non-complaint class.
pub const NON_COMPLAINT_COLOR: &str = "#22c55e";

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// One class in the bar and pie charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    pub label: &'static str,
    pub count: u64,
    /// Share of `total_processed`, rounded to one decimal place.
    pub percentage: f64,
    pub color: &'static str,
}

/// Everything the results views need, derived from one summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub total_processed: u64,
    pub accuracy: f64,
    pub average_confidence: Option<f64>,
    pub processing_time: Option<f64>,
    /// Complaints first, then non-complaints.
    pub classes: Vec<ChartDatum>,
    pub partition_consistent: bool,
}

impl ResultView {
    pub fn complaints(&self) -> &ChartDatum {
        &self.classes[0]
    }

    pub fn non_complaints(&self) -> &ChartDatum {
        &self.classes[1]
    }
}

/// `count / total × 100`, rounded to one decimal. Zero when `total` is zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = (count as f64 / total as f64) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Build the view model for a summary.
pub fn render(summary: &AnalysisSummary) -> ResultView {
    let total = summary.total_processed;
    ResultView {
        total_processed: total,
        accuracy: summary.accuracy,
        average_confidence: summary.average_confidence,
        processing_time: summary.processing_time,
        classes: vec![
            ChartDatum {
                label: "Complaints",
                count: summary.complaint_count,
                percentage: percentage(summary.complaint_count, total),
                color: COMPLAINT_COLOR,
            },
            ChartDatum {
                label: "Non-Complaints",
                count: summary.non_complaint_count,
                percentage: percentage(summary.non_complaint_count, total),
                color: NON_COMPLAINT_COLOR,
            },
        ],
        partition_consistent: summary.is_partition_consistent(),
    }
}

// ---------------------------------------------------------------------------
// Terminal chart
// ---------------------------------------------------------------------------

/// Horizontal bar chart lines, one per class, scaled so the largest count
/// fills `width` cells.
pub fn bar_chart_lines(view: &ResultView, width: usize) -> Vec<String> {
    let max = view.classes.iter().map(|c| c.count).max().unwrap_or(0);
    let label_width = view.classes.iter().map(|c| c.label.len()).max().unwrap_or(0);

    view.classes
        .iter()
        .map(|class| {
            let filled = if max == 0 {
                0
            } else {
                ((class.count as f64 / max as f64) * width as f64).round() as usize
            };
            format!(
                "{:<label_width$} {}{} {} ({:.1}%)",
                class.label,
                "█".repeat(filled),
                " ".repeat(width - filled),
                class.count,
                class.percentage,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Download naming / saving
// ---------------------------------------------------------------------------

/// Download name for an analysis of `uploaded_name`:
/// `complaint_analysis_<uploaded file name>`.
pub fn download_file_name(uploaded_name: &str) -> String {
    format!("complaint_analysis_{}", sanitize_file_name(uploaded_name))
}

/// Download name when only the result id is known.
pub fn result_id_file_name(result_id: &str) -> String {
    format!("complaint_analysis_{}.xlsx", sanitize_file_name(result_id))
}

/// Keep only the final path component and replace characters that are
/// invalid in file names on common platforms.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "results".to_string()
    } else {
        cleaned
    }
}

/// Write artifact bytes to `dir/file_name`, creating `dir` if needed.
/// Returns the written path.
pub fn save_artifact(bytes: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create download directory {}", dir.display()))?;
    }
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
