/// Classifier client tests against a scripted local service.
///
/// Each test starts its own mock on an ephemeral port, so they run in
/// parallel without sharing state.
mod common;

use aihub::classifier::{ClassifierApi, ClassifierClient, ModelState};
use aihub::config::schema::ClassifierConfig;
use common::{ANALYZE_OK, MockResponse, MockService, UPLOAD_OK};

fn client_for(mock: &MockService) -> ClassifierClient {
    ClassifierClient::new(&ClassifierConfig {
        base_url: mock.base_url.clone(),
        timeout_ms: 5_000,
        ..ClassifierConfig::default()
    })
}

// ---------------------------------------------------------------------------
// Workflow calls
// ---------------------------------------------------------------------------

#[test]
fn upload_sends_multipart_file() {
    let mock = MockService::start(vec![MockResponse::json(200, UPLOAD_OK)]);
    let client = client_for(&mock);

    let upload = client
        .upload_file("complaints.csv", b"id,text\n1,late delivery\n")
        .unwrap();
    assert_eq!(upload.file_id, "f-250");
    assert_eq!(upload.total_rows, 250);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.url, "/upload-file");
    assert!(
        req.content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("multipart/form-data; boundary=")
    );
    assert!(req.body_contains(b"name=\"file\"; filename=\"complaints.csv\""));
    assert!(req.body_contains(b"Content-Type: text/csv"));
    assert!(req.body_contains(b"1,late delivery"));
}

#[test]
fn upload_without_file_id_fails() {
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"success": true, "file_id": "  "}"#,
    )]);
    let err = client_for(&mock)
        .upload_file("complaints.csv", b"id\n1\n")
        .unwrap_err();
    assert!(format!("{err:#}").contains("no file id"));
}

#[test]
fn analyze_posts_file_id_and_column() {
    let mock = MockService::start(vec![MockResponse::json(200, ANALYZE_OK)]);
    let client = client_for(&mock);

    let resp = client.analyze_file("f-250", "text").unwrap();
    assert_eq!(resp.result_id, "r-250");
    assert_eq!(resp.summary.complaint_count, 90);
    assert_eq!(resp.summary.non_complaint_count, 160);
    assert_eq!(resp.summary.total_processed, 250);
    assert_eq!(resp.summary.processing_time, Some(3.2));

    let requests = mock.requests();
    assert_eq!(requests[0].url, "/analyze-file");
    assert_eq!(
        requests[0].json(),
        serde_json::json!({"file_id": "f-250", "text_column": "text"})
    );
}

#[test]
fn analyze_success_false_surfaces_message() {
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"success": false, "message": "Model not initialized"}"#,
    )]);
    let err = client_for(&mock).analyze_file("f-1", "text").unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("analysis failed"));
    assert!(msg.contains("Model not initialized"));
}

#[test]
fn http_error_carries_service_detail() {
    let mock = MockService::start(vec![MockResponse::json(
        400,
        r#"{"detail": "Column 'body' not found in file"}"#,
    )]);
    let err = client_for(&mock).analyze_file("f-1", "body").unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("HTTP 400"));
    assert!(msg.contains("Column 'body' not found in file"));
}

#[test]
fn http_error_without_detail_reports_status() {
    let mock = MockService::start(vec![MockResponse::json(503, "Service Unavailable")]);
    let err = client_for(&mock).analyze_file("f-1", "text").unwrap_err();
    assert!(format!("{err:#}").contains("HTTP 503"));
}

#[test]
fn download_returns_artifact_bytes() {
    let artifact = b"PK\x03\x04 result workbook";
    let mock = MockService::start(vec![MockResponse::bytes(artifact)]);

    let bytes = client_for(&mock).download("r-250").unwrap();
    assert_eq!(bytes, artifact);
    assert_eq!(mock.urls(), vec!["/download/r-250"]);
}

#[test]
fn download_rejects_unsafe_result_id_without_request() {
    let mock = MockService::start(vec![]);
    assert!(client_for(&mock).download("../etc/passwd").is_err());
    assert!(mock.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Model lifecycle
// ---------------------------------------------------------------------------

#[test]
fn status_reports_model_state() {
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"status": "ready", "model_loaded": true, "device": "cuda:0", "memory_usage": "2.1 GB"}"#,
    )]);
    let status = client_for(&mock).status().unwrap();
    assert_eq!(status.status, ModelState::Ready);
    assert!(status.model_loaded);
    assert_eq!(status.device.as_deref(), Some("cuda:0"));
    assert_eq!(mock.urls(), vec!["/status"]);
}

#[test]
fn initialize_posts_and_returns_message() {
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"message": "Model initialization started"}"#,
    )]);
    let resp = client_for(&mock).initialize().unwrap();
    assert_eq!(resp.message, "Model initialization started");

    let requests = mock.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/initialize");
}

#[test]
fn service_info_returns_document() {
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"model": "distilbert-complaints", "version": "1.2", "classes": ["complaint", "non-complaint"]}"#,
    )]);
    let info = client_for(&mock).service_info().unwrap();
    assert_eq!(info["model"], "distilbert-complaints");
    assert_eq!(info["classes"][1], "non-complaint");
    assert_eq!(mock.urls(), vec!["/info"]);
}

#[test]
fn health_reports_status() {
    let mock = MockService::start(vec![MockResponse::json(200, r#"{"status": "healthy"}"#)]);
    let health = client_for(&mock).health().unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(mock.urls(), vec!["/health"]);
}

#[test]
fn answering_service_is_healthy() {
    let mock = MockService::start(vec![MockResponse::json(200, r#"{"status": "healthy"}"#)]);
    assert!(client_for(&mock).is_healthy());
    assert_eq!(mock.urls(), vec!["/health"]);
}

#[test]
fn unreachable_service_is_unhealthy() {
    // Grab a free port, then release it so nothing is listening there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = ClassifierClient::new(&ClassifierConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_ms: 2_000,
        ..ClassifierConfig::default()
    });

    assert!(!client.is_healthy());
    let err = client.status().unwrap_err();
    assert!(format!("{err:#}").contains("could not reach classifier service"));
}
