//! History reporter: aggregate totals, per-file breakdown, and daily trend
//! over the analysis log.

use std::collections::HashMap;

use serde::Serialize;

use crate::history::logger::{HistoryEntry, HistoryLog};
use crate::report::percentage;

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary for `aihub history`.
#[derive(Debug, Serialize)]
pub struct HistoryStats {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub total_processed: u64,
    pub total_complaints: u64,
    pub total_non_complaints: u64,
    /// Complaints as a share of everything processed, one decimal.
    pub complaint_rate: f64,
    /// Mean accuracy over successful runs.
    pub avg_accuracy: f64,
    pub avg_latency_ms: u64,
    pub files: Vec<FileStat>,
    pub daily: Vec<DailyStat>,
}

/// Per-file aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    pub file_name: String,
    pub runs: usize,
    pub total_processed: u64,
    pub total_complaints: u64,
    pub complaint_rate: f64,
    /// Timestamp of the most recent run.
    pub last_run: String,
}

/// One day in the trend.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStat {
    pub date: String,
    pub runs: usize,
    pub total_processed: u64,
    pub total_complaints: u64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Aggregate the log, optionally restricted to the last `days` days.
pub fn compute_stats(log: &HistoryLog, days: Option<u32>) -> HistoryStats {
    build_stats(&log.read_since_days(days))
}

pub fn build_stats(entries: &[HistoryEntry]) -> HistoryStats {
    let successful: Vec<&HistoryEntry> = entries.iter().filter(|e| e.success).collect();

    let total_processed = saturating_sum(successful.iter().map(|e| e.total_processed));
    let total_complaints = saturating_sum(successful.iter().map(|e| e.complaint_count));
    let total_non_complaints = saturating_sum(successful.iter().map(|e| e.non_complaint_count));

    let avg_accuracy = if successful.is_empty() {
        0.0
    } else {
        successful.iter().map(|e| e.accuracy).sum::<f64>() / successful.len() as f64
    };

    let avg_latency_ms = if entries.is_empty() {
        0
    } else {
        saturating_sum(entries.iter().map(|e| e.latency_ms)) / entries.len() as u64
    };

    HistoryStats {
        total_runs: entries.len(),
        successful_runs: successful.len(),
        failed_runs: entries.len() - successful.len(),
        total_processed,
        total_complaints,
        total_non_complaints,
        complaint_rate: percentage(total_complaints, total_processed),
        avg_accuracy,
        avg_latency_ms,
        files: compute_file_stats(&successful),
        daily: compute_daily(&successful),
    }
}

/// Group successful runs by file name; busiest files first.
fn compute_file_stats(entries: &[&HistoryEntry]) -> Vec<FileStat> {
    let mut groups: HashMap<&str, Vec<&HistoryEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.file_name.as_str()).or_default().push(*entry);
    }

    let mut stats: Vec<FileStat> = groups
        .into_iter()
        .map(|(file_name, group)| {
            let total_processed = saturating_sum(group.iter().map(|e| e.total_processed));
            let total_complaints = saturating_sum(group.iter().map(|e| e.complaint_count));
            let last_run = group
                .iter()
                .map(|e| e.timestamp.as_str())
                .max()
                .unwrap_or_default()
                .to_string();

            FileStat {
                file_name: file_name.to_string(),
                runs: group.len(),
                total_processed,
                total_complaints,
                complaint_rate: percentage(total_complaints, total_processed),
                last_run,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_processed
            .cmp(&a.total_processed)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    stats
}

/// Group successful runs by date (YYYY-MM-DD), oldest first.
fn compute_daily(entries: &[&HistoryEntry]) -> Vec<DailyStat> {
    let mut daily: HashMap<String, Vec<&HistoryEntry>> = HashMap::new();
    for entry in entries {
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        daily.entry(date).or_default().push(*entry);
    }

    let mut trend: Vec<DailyStat> = daily
        .into_iter()
        .map(|(date, group)| DailyStat {
            date,
            runs: group.len(),
            total_processed: saturating_sum(group.iter().map(|e| e.total_processed)),
            total_complaints: saturating_sum(group.iter().map(|e| e.complaint_count)),
        })
        .collect();

    trend.sort_by(|a, b| a.date.cmp(&b.date));
    trend
}

/// Sum of service-reported counts, pinned at `u64::MAX` instead of
/// overflowing.
fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
