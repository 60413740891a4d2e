//! Request / response types for the complaint classifier REST API.
//!
//! Only the fields the workbench actually uses are typed; anything else the
//! service sends is ignored. `/info` is implementation-defined and stays a
//! raw `serde_json::Value`.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// /initialize, /health
// ---------------------------------------------------------------------------

/// Response body from `POST /initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(default)]
    pub message: String,
}

/// Response body from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ---------------------------------------------------------------------------
// /status
// ---------------------------------------------------------------------------

/// Model lifecycle state reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Ready,
    Loading,
    Error,
    /// Any state string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Loading => write!(f, "loading"),
            Self::Error => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Polled snapshot of the remote model. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub status: ModelState,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Free-form: some deployments report a number of MB, others a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions_today: Option<u64>,
}

impl ModelStatus {
    /// Human-readable memory usage, if reported.
    pub fn memory_usage_display(&self) -> Option<String> {
        match self.memory_usage.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// /upload-file
// ---------------------------------------------------------------------------

/// Response body from `POST /upload-file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub file_id: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Short server-side preview; shape is up to the service.
    #[serde(default)]
    pub preview: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_rows: usize,
}

// ---------------------------------------------------------------------------
// /analyze-file
// ---------------------------------------------------------------------------

/// Request body for `POST /analyze-file`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub file_id: &'a str,
    pub text_column: &'a str,
}

/// Classification summary returned by `/analyze-file`.
///
/// `complaint_count + non_complaint_count == total_processed` is not
/// guaranteed by the service; see [`AnalysisSummary::is_partition_consistent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub complaint_count: u64,
    pub non_complaint_count: u64,
    pub total_processed: u64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl AnalysisSummary {
    /// Whether the two classes add up to the processed total.
    pub fn is_partition_consistent(&self) -> bool {
        self.complaint_count.checked_add(self.non_complaint_count) == Some(self.total_processed)
    }
}

/// Response body from `POST /analyze-file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub summary: AnalysisSummary,
    pub result_id: String,
}
