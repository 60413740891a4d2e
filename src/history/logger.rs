use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::{HistoryConfig, expand_home};
use crate::workflow::AnalysisResult;

// ---------------------------------------------------------------------------
// History entry (JSONL)
// ---------------------------------------------------------------------------

/// One line in the analysis log (`~/.aihub/analysis-log.jsonl` by default).
///
/// Written for every analyze attempt, successful or not. Failed attempts
/// carry `error` and zeroed counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub file_name: String,
    pub text_column: String,
    /// Data rows in the uploaded file.
    pub total_rows: usize,
    #[serde(default)]
    pub complaint_count: u64,
    #[serde(default)]
    pub non_complaint_count: u64,
    #[serde(default)]
    pub total_processed: u64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time of upload + analyze in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_true() -> bool {
    true
}

impl HistoryEntry {
    /// Entry for a completed analysis.
    pub fn success(result: &AnalysisResult, file_name: &str, total_rows: usize, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            file_name: file_name.to_string(),
            text_column: result.text_column.clone(),
            total_rows,
            complaint_count: result.summary.complaint_count,
            non_complaint_count: result.summary.non_complaint_count,
            total_processed: result.summary.total_processed,
            accuracy: result.summary.accuracy,
            result_id: Some(result.result_id.clone()),
            success: true,
            error: None,
            latency_ms,
        }
    }

    /// Entry for a failed analysis.
    pub fn failure(
        file_name: &str,
        text_column: &str,
        total_rows: usize,
        error: &str,
        latency_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            file_name: file_name.to_string(),
            text_column: text_column.to_string(),
            total_rows,
            complaint_count: 0,
            non_complaint_count: 0,
            total_processed: 0,
            accuracy: 0.0,
            result_id: None,
            success: false,
            error: Some(error.to_string()),
            latency_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Log file
// ---------------------------------------------------------------------------

/// Handle to the analysis log. A disabled log accepts writes and drops them.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: Option<PathBuf>,
}

impl HistoryLog {
    pub fn from_config(config: &HistoryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&config.path),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry, ignoring I/O failures. Logging never breaks a run.
    pub fn record(&self, entry: &HistoryEntry) {
        let _ = self.append(entry);
    }

    /// Append an entry as one JSON line.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Every entry in the log. Malformed lines are skipped; a missing file
    /// yields an empty list.
    pub fn read_all(&self) -> Vec<HistoryEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<HistoryEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days, or all entries for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<HistoryEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> HistoryLog {
        let dir = std::env::temp_dir().join(format!("aihub-history-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        HistoryLog::at(dir.join("nested").join("log.jsonl"))
    }

    #[test]
    fn append_then_read_back() {
        let log = temp_log("roundtrip");
        log.append(&HistoryEntry::failure("a.csv", "text", 3, "boom", 12))
            .unwrap();
        log.append(&HistoryEntry::failure("b.csv", "body", 5, "bang", 7))
            .unwrap();

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "a.csv");
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("bang"));

        let _ = fs::remove_dir_all(log.path().unwrap().parent().unwrap().parent().unwrap());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let log = temp_log("malformed");
        log.append(&HistoryEntry::failure("a.csv", "text", 1, "x", 1))
            .unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(log.path().unwrap())
            .unwrap();
        writeln!(file, "not json").unwrap();

        assert_eq!(log.read_all().len(), 1);
        let _ = fs::remove_dir_all(log.path().unwrap().parent().unwrap().parent().unwrap());
    }

    #[test]
    fn missing_file_reads_empty() {
        let log = temp_log("missing");
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn disabled_log_drops_writes() {
        let log = HistoryLog::from_config(&HistoryConfig {
            enabled: false,
            path: "/tmp/never-written.jsonl".to_string(),
        });
        assert!(log.path().is_none());
        log.record(&HistoryEntry::failure("a.csv", "text", 1, "x", 1));
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn day_filter_drops_old_entries() {
        let log = temp_log("days");
        let mut old = HistoryEntry::failure("old.csv", "text", 1, "x", 1);
        old.timestamp = "2001-01-01T00:00:00+00:00".to_string();
        log.append(&old).unwrap();
        log.append(&HistoryEntry::failure("new.csv", "text", 1, "x", 1))
            .unwrap();

        assert_eq!(log.read_since_days(None).len(), 2);
        let recent = log.read_since_days(Some(7));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].file_name, "new.csv");
        let _ = fs::remove_dir_all(log.path().unwrap().parent().unwrap().parent().unwrap());
    }

    #[test]
    fn entries_without_optional_fields_parse() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"timestamp":"2026-01-01T00:00:00+00:00","file_name":"a.csv","text_column":"t","total_rows":4}"#,
        )
        .unwrap();
        assert!(entry.success);
        assert_eq!(entry.total_processed, 0);
        assert!(entry.result_id.is_none());
    }
}
