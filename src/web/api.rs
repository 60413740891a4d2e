//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a [`Reply`];
//! the server turns it into a `tiny_http` response. Workflow endpoints all
//! answer with the full [`SessionResponse`] so the page can re-render from a
//! single source of truth.

use std::time::Instant;

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::history::HistoryEntry;
use crate::history::reporter;
use crate::ingest::UploadedData;
use crate::ingest::stats::{self, ColumnStats, DatasetOverview};
use crate::report::{self, ResultView};
use crate::workflow::{AnalysisResult, Stage, Workflow};

use super::Dashboard;

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// What a handler wants sent back.
#[derive(Debug)]
pub enum Reply {
    Html(&'static str),
    Json(u16, serde_json::Value),
    File {
        file_name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Self::Json(status, _) => *status,
            Self::Html(_) | Self::File { .. } => 200,
        }
    }
}

/// Build a JSON success reply.
fn json_reply<T: Serialize>(data: &T) -> Result<Reply> {
    let value = serde_json::to_value(data).context("failed to serialize JSON response")?;
    Ok(Reply::Json(200, value))
}

fn error_reply(status: u16, message: impl std::fmt::Display) -> Reply {
    Reply::Json(status, serde_json::json!({ "error": message.to_string() }))
}

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

/// Current workflow session.
#[derive(Debug, Serialize)]
pub struct SessionResponse<'a> {
    pub stage: Stage,
    pub file_name: Option<&'a str>,
    pub data: Option<&'a UploadedData>,
    pub overview: Option<DatasetOverview>,
    pub columns: Vec<ColumnStats>,
    pub selected_column: Option<&'a str>,
    pub result: Option<&'a AnalysisResult>,
    pub view: Option<ResultView>,
    pub error: Option<&'a str>,
}

impl<'a> SessionResponse<'a> {
    pub fn from_workflow(workflow: &'a Workflow) -> Self {
        let data = workflow.data();
        let columns = data
            .map(|d| stats::column_stats(&d.headers, d.all_rows()))
            .unwrap_or_default();
        let overview = data.map(|d| stats::overview(&columns, d.total_rows));
        let result = workflow.result();

        Self {
            stage: workflow.stage(),
            file_name: workflow.file_name(),
            data,
            overview,
            columns,
            selected_column: workflow.selected_column(),
            result,
            view: result.map(|r| report::render(&r.summary)),
            error: workflow.last_error(),
        }
    }
}

/// `POST /api/column` body.
#[derive(Debug, Deserialize)]
struct ColumnRequest {
    column: String,
}

/// Health API response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    service_url: String,
    service_reachable: bool,
    config_exists: bool,
    history_enabled: bool,
    allowed_extensions: Vec<String>,
    preview_rows: usize,
    poll_interval_secs: u64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the `?days=N` query parameter from a URL.
fn parse_days_param(url: &str) -> Option<u32> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == "days" { v.parse().ok() } else { None }
    })
}

/// Decode `%XX` escapes (as produced by `encodeURIComponent`). Invalid
/// escapes are kept literally; invalid UTF-8 is replaced.
pub fn percent_decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Content type of a result artifact, sniffed from its leading bytes.
///
/// The service answers with a spreadsheet whatever the uploaded file was,
/// so the download name's extension is no guide.
fn artifact_content_type(bytes: &[u8]) -> &'static str {
    const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
    const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

    if bytes.starts_with(ZIP_MAGIC) {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else if bytes.starts_with(OLE_MAGIC) {
        "application/vnd.ms-excel"
    } else {
        "application/octet-stream"
    }
}

// ---------------------------------------------------------------------------
// API Handlers: classifier model
// ---------------------------------------------------------------------------

/// `GET /api/status`: model status, polled by the page.
pub fn get_status(dashboard: &Dashboard) -> Result<Reply> {
    match dashboard.client.status() {
        Ok(status) => {
            let mut value = serde_json::to_value(&status)?;
            value["poll_interval_secs"] = dashboard.client.poll_interval().as_secs().into();
            Ok(Reply::Json(200, value))
        }
        Err(e) => Ok(error_reply(502, format!("{e:#}"))),
    }
}

/// `GET /api/health`: service reachability and local settings.
pub fn get_health(dashboard: &Dashboard) -> Result<Reply> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    let resp = HealthResponse {
        service_url: dashboard.client.base_url().to_string(),
        service_reachable: dashboard.client.is_healthy(),
        config_exists,
        history_enabled: dashboard.history.path().is_some(),
        allowed_extensions: dashboard.config.upload.allowed_extensions.clone(),
        preview_rows: dashboard.config.upload.preview_rows,
        poll_interval_secs: dashboard.client.poll_interval().as_secs(),
    };

    json_reply(&resp)
}

/// `POST /api/initialize`: ask the service to load its model.
pub fn post_initialize(dashboard: &Dashboard) -> Result<Reply> {
    match dashboard.client.initialize() {
        Ok(resp) => json_reply(&serde_json::json!({
            "success": true,
            "message": resp.message,
        })),
        Err(e) => Ok(error_reply(502, format!("{e:#}"))),
    }
}

// ---------------------------------------------------------------------------
// API Handlers: workflow
// ---------------------------------------------------------------------------

/// `GET /api/session`: current workflow state.
pub fn get_session(dashboard: &Dashboard) -> Result<Reply> {
    json_reply(&SessionResponse::from_workflow(&dashboard.workflow))
}

/// `POST /api/upload`: raw file body, name in the `X-File-Name` header.
pub fn post_upload(dashboard: &mut Dashboard, file_name: Option<&str>, body: &[u8]) -> Result<Reply> {
    let Some(file_name) = file_name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(error_reply(400, "missing X-File-Name header"));
    };

    dashboard.workflow.select_file(file_name, body.to_vec())?;
    get_session(dashboard)
}

/// `POST /api/column`: `{ "column": "text" }`.
pub fn post_column(dashboard: &mut Dashboard, body: &[u8]) -> Result<Reply> {
    let req: ColumnRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return Ok(error_reply(400, format!("invalid column request: {e}"))),
    };

    dashboard.workflow.select_column(&req.column)?;
    get_session(dashboard)
}

/// `POST /api/analyze`: upload and classify the selected column.
///
/// Every attempt that reaches the classifier is appended to the history log.
pub fn post_analyze(dashboard: &mut Dashboard) -> Result<Reply> {
    let file_name = dashboard.workflow.file_name().unwrap_or_default().to_string();
    let column = dashboard
        .workflow
        .selected_column()
        .unwrap_or_default()
        .to_string();
    let total_rows = dashboard.workflow.data().map(|d| d.total_rows).unwrap_or(0);

    let started = Instant::now();
    let outcome = dashboard.workflow.analyze(&dashboard.client).map(|r| r.clone());
    let latency_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            dashboard
                .history
                .record(&HistoryEntry::success(&result, &file_name, total_rows, latency_ms));
        }
        Err(e) => {
            if matches!(e, crate::workflow::WorkflowError::Remote(_)) {
                dashboard.history.record(&HistoryEntry::failure(
                    &file_name,
                    &column,
                    total_rows,
                    &format!("{e:#}"),
                    latency_ms,
                ));
            }
            return Err(e.into());
        }
    }

    get_session(dashboard)
}

/// `POST /api/reset`: back to an empty session.
pub fn post_reset(dashboard: &mut Dashboard) -> Result<Reply> {
    dashboard.workflow.reset();
    get_session(dashboard)
}

/// `GET /api/download`: result artifact for the current results.
pub fn get_download(dashboard: &Dashboard) -> Result<Reply> {
    let (file_name, bytes) = dashboard.workflow.download(&dashboard.client)?;
    Ok(Reply::File {
        content_type: artifact_content_type(&bytes),
        file_name,
        bytes,
    })
}

// ---------------------------------------------------------------------------
// API Handlers: history
// ---------------------------------------------------------------------------

/// `GET /api/history?days=N`: aggregated analysis history.
pub fn get_history(dashboard: &Dashboard, url: &str) -> Result<Reply> {
    let days = parse_days_param(url);
    json_reply(&reporter::compute_stats(&dashboard.history, days))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
