/// HTTP client for the complaint classifier service.
///
/// Uses the synchronous `ureq` client. Each method maps to one REST call:
///
/// - **Metadata**: `GET /info`, `GET /health`
/// - **Model lifecycle**: `POST /initialize`, `GET /status` (polled)
/// - **Workflow**: `POST /upload-file`, `POST /analyze-file`,
///   `GET /download/{result_id}`
///
/// The upload is the one multipart call and goes through `reqwest`'s
/// blocking multipart form; everything else is plain `ureq`.
///
/// There is no retry policy and no cancellation: a failed call surfaces the
/// server's `detail` message (FastAPI style) when it sent one, and the user
/// re-triggers the action.
use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{
    AnalyzeRequest, AnalyzeResponse, HealthResponse, InitializeResponse, ModelStatus,
    UploadResponse,
};
use crate::config::schema::ClassifierConfig;

/// Upper bound for a downloaded result artifact.
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Timeout for the liveness check, independent of the request timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Seam used by the workflow
// ---------------------------------------------------------------------------

/// The calls the upload → analyze → download workflow depends on.
///
/// [`ClassifierClient`] is the real implementation; tests substitute fakes
/// that record whether the network would have been touched.
pub trait ClassifierApi {
    fn upload_file(&self, file_name: &str, bytes: &[u8]) -> Result<UploadResponse>;
    fn analyze_file(&self, file_id: &str, text_column: &str) -> Result<AnalyzeResponse>;
    fn download(&self, result_id: &str) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous classifier client.
///
/// Built from an explicit [`ClassifierConfig`]; holds no global state and is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ClassifierClient {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Interval between `/status` polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// `GET /info`: service metadata, shape defined by the service.
    pub fn service_info(&self) -> Result<serde_json::Value> {
        let resp = ureq::get(&self.endpoint("/info"))
            .timeout(self.timeout)
            .call()
            .map_err(|e| request_error("service info", e))?;
        read_json(resp, "service info")
    }

    /// `POST /initialize`: ask the service to load its model. Idempotent on
    /// the server side.
    pub fn initialize(&self) -> Result<InitializeResponse> {
        let resp = ureq::post(&self.endpoint("/initialize"))
            .timeout(self.timeout)
            .call()
            .map_err(|e| request_error("initialize", e))?;
        read_json(resp, "initialize")
    }

    /// `GET /status`: model readiness snapshot.
    pub fn status(&self) -> Result<ModelStatus> {
        let resp = ureq::get(&self.endpoint("/status"))
            .timeout(self.timeout)
            .call()
            .map_err(|e| request_error("status", e))?;
        read_json(resp, "status")
    }

    /// `GET /health`: liveness.
    pub fn health(&self) -> Result<HealthResponse> {
        let resp = ureq::get(&self.endpoint("/health"))
            .timeout(HEALTH_TIMEOUT)
            .call()
            .map_err(|e| request_error("health", e))?;
        read_json(resp, "health")
    }

    /// Whether `/health` answers at all, with a short timeout.
    pub fn is_healthy(&self) -> bool {
        self.health().is_ok()
    }

    /// Browser-facing URL of a result artifact.
    pub fn download_url(&self, result_id: &str) -> String {
        format!("{}/download/{}", self.base_url, result_id)
    }

    /// Request URL for an endpoint path.
    ///
    /// "localhost" may resolve to IPv6 (::1) first, which stalls when the
    /// service only binds IPv4, so requests go to 127.0.0.1 directly. Only
    /// an exact `localhost` host is rewritten.
    fn endpoint(&self, path: &str) -> String {
        let raw = format!("{}{}", self.base_url, path);
        if let Ok(mut url) = Url::parse(&raw)
            && url.host_str() == Some("localhost")
            && url.set_host(Some("127.0.0.1")).is_ok()
        {
            return url.into();
        }
        raw
    }
}

impl ClassifierApi for ClassifierClient {
    /// `POST /upload-file`: multipart upload of the raw spreadsheet bytes.
    fn upload_file(&self, file_name: &str, bytes: &[u8]) -> Result<UploadResponse> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type_for(file_name))
            .context("upload failed: invalid content type")?;
        let form = Form::new().part("file", part);

        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build upload client")?;
        let resp = http
            .post(self.endpoint("/upload-file"))
            .multipart(form)
            .send()
            .map_err(|e| {
                anyhow::anyhow!("upload failed: could not reach classifier service: {e}")
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("upload", status.as_u16(), resp.text().ok()));
        }
        let value: serde_json::Value = resp
            .json()
            .context("upload failed: response was not valid JSON")?;

        let upload: UploadResponse = decode_json(value, "upload")?;
        if upload.file_id.trim().is_empty() {
            anyhow::bail!("upload failed: service returned no file id");
        }
        Ok(upload)
    }

    /// `POST /analyze-file`: classify one column of an uploaded file.
    fn analyze_file(&self, file_id: &str, text_column: &str) -> Result<AnalyzeResponse> {
        let resp = ureq::post(&self.endpoint("/analyze-file"))
            .timeout(self.timeout)
            .send_json(AnalyzeRequest {
                file_id,
                text_column,
            })
            .map_err(|e| request_error("analysis", e))?;
        read_json(resp, "analysis")
    }

    /// `GET /download/{result_id}`: fetch the result spreadsheet.
    fn download(&self, result_id: &str) -> Result<Vec<u8>> {
        validate_result_id(result_id)?;

        let resp = ureq::get(&self.endpoint(&format!("/download/{result_id}")))
            .timeout(self.timeout)
            .call()
            .map_err(|e| request_error("download", e))?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_DOWNLOAD_BYTES)
            .read_to_end(&mut bytes)
            .context("failed to read result artifact")?;

        if bytes.is_empty() {
            anyhow::bail!("download failed: result artifact is empty");
        }
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// MIME type for an upload, by file extension.
fn content_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        "text/csv"
    } else if lower.ends_with(".xlsx") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else if lower.ends_with(".xls") {
        "application/vnd.ms-excel"
    } else {
        "application/octet-stream"
    }
}

/// Read a `ureq` JSON body.
fn read_json<T: DeserializeOwned>(resp: ureq::Response, action: &str) -> Result<T> {
    let value: serde_json::Value = resp
        .into_json()
        .with_context(|| format!("{action} failed: response was not valid JSON"))?;
    decode_json(value, action)
}

/// Decode a JSON body, treating `"success": false` as a failure.
fn decode_json<T: DeserializeOwned>(value: serde_json::Value, action: &str) -> Result<T> {
    if value.get("success").and_then(|s| s.as_bool()) == Some(false) {
        let detail = error_detail(&value).unwrap_or_else(|| "service reported failure".into());
        anyhow::bail!("{action} failed: {detail}");
    }

    serde_json::from_value(value)
        .with_context(|| format!("{action} failed: unexpected response shape"))
}

/// Turn a transport or HTTP-status error into a user-facing message.
fn request_error(action: &str, err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, resp) => status_error(action, code, resp.into_string().ok()),
        ureq::Error::Transport(transport) => {
            anyhow::anyhow!("{action} failed: could not reach classifier service: {transport}")
        }
    }
}

/// Error for a non-2xx response, with the service's detail when the body
/// carries one.
fn status_error(action: &str, code: u16, body: Option<String>) -> anyhow::Error {
    let detail = body
        .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
        .and_then(|value| error_detail(&value));
    match detail {
        Some(detail) => anyhow::anyhow!("{action} failed (HTTP {code}): {detail}"),
        None => anyhow::anyhow!("{action} failed with HTTP {code}"),
    }
}

/// Pull the most specific message out of an error body.
///
/// FastAPI sends `detail` (a string, or a list of validation errors); other
/// services use `message` or `error`.
fn error_detail(value: &serde_json::Value) -> Option<String> {
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|detail| match detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .map(str::to_string)
                    .collect();
                if msgs.is_empty() {
                    Some(detail.to_string())
                } else {
                    Some(msgs.join("; "))
                }
            }
            serde_json::Value::Null | serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        })
}

/// Result ids are interpolated into a URL path.
fn validate_result_id(result_id: &str) -> Result<()> {
    let ok = !result_id.is_empty()
        && result_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && result_id != "."
        && result_id != "..";
    if !ok {
        anyhow::bail!("invalid result id: {result_id:?}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = ClassifierClient::new(&ClassifierConfig::default());
        assert_eq!(client.base_url(), "http://localhost:8001");
        assert_eq!(client.timeout, Duration::from_millis(300_000));
        assert_eq!(client.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = ClassifierClient::new(&ClassifierConfig {
            base_url: "http://classifier:8001/".to_string(),
            ..ClassifierConfig::default()
        });
        assert_eq!(client.download_url("r-1"), "http://classifier:8001/download/r-1");
    }

    #[test]
    fn endpoint_avoids_localhost_resolution() {
        let client = ClassifierClient::new(&ClassifierConfig::default());
        assert_eq!(client.endpoint("/status"), "http://127.0.0.1:8001/status");
    }

    #[test]
    fn endpoint_keeps_hosts_that_merely_start_with_localhost() {
        let client = ClassifierClient::new(&ClassifierConfig {
            base_url: "http://localhost-classifier:8001".to_string(),
            ..ClassifierConfig::default()
        });
        assert_eq!(
            client.endpoint("/status"),
            "http://localhost-classifier:8001/status"
        );

        let client = ClassifierClient::new(&ClassifierConfig {
            base_url: "http://classifier.localhost:8001".to_string(),
            ..ClassifierConfig::default()
        });
        assert_eq!(
            client.endpoint("/status"),
            "http://classifier.localhost:8001/status"
        );
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for("A.CSV"), "text/csv");
        assert_eq!(content_type_for("b.xls"), "application/vnd.ms-excel");
        assert!(content_type_for("c.xlsx").contains("spreadsheetml"));
        assert_eq!(content_type_for("d.bin"), "application/octet-stream");
    }

    #[test]
    fn status_error_uses_detail_when_json() {
        let err = status_error("upload", 422, Some(r#"{"detail": "bad file"}"#.to_string()));
        assert_eq!(err.to_string(), "upload failed (HTTP 422): bad file");

        let err = status_error("upload", 500, Some("Internal Server Error".to_string()));
        assert_eq!(err.to_string(), "upload failed with HTTP 500");
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let client = ClassifierClient::new(&ClassifierConfig {
            poll_interval_secs: 0,
            ..ClassifierConfig::default()
        });
        assert_eq!(client.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn error_detail_prefers_detail_string() {
        let value = serde_json::json!({"detail": "Model not initialized", "message": "x"});
        assert_eq!(error_detail(&value).as_deref(), Some("Model not initialized"));
    }

    #[test]
    fn error_detail_joins_validation_messages() {
        let value = serde_json::json!({"detail": [
            {"loc": ["body", "file_id"], "msg": "field required"},
            {"loc": ["body", "text_column"], "msg": "field required"}
        ]});
        assert_eq!(
            error_detail(&value).as_deref(),
            Some("field required; field required")
        );
    }

    #[test]
    fn error_detail_falls_back_to_message_and_error() {
        assert_eq!(
            error_detail(&serde_json::json!({"message": "bad column"})).as_deref(),
            Some("bad column")
        );
        assert_eq!(
            error_detail(&serde_json::json!({"error": "boom"})).as_deref(),
            Some("boom")
        );
        assert_eq!(error_detail(&serde_json::json!({"ok": true})), None);
    }

    #[test]
    fn result_ids_are_path_safe() {
        assert!(validate_result_id("3f2a-91_b.x").is_ok());
        assert!(validate_result_id("").is_err());
        assert!(validate_result_id("..").is_err());
        assert!(validate_result_id("a/b").is_err());
        assert!(validate_result_id("a b").is_err());
    }
}
