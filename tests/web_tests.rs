/// Dashboard API tests: requests go through the router exactly as the HTTP
/// server would send them, with a mocked classifier service behind it.
mod common;

use aihub::config::AiHubConfig;
use aihub::web::api::Reply;
use aihub::web::{Dashboard, dispatch, error_status};
use common::{ANALYZE_OK, MockResponse, MockService, UPLOAD_OK};
use tiny_http::Method;

fn dashboard(mock: &MockService, history_dir: &std::path::Path) -> Dashboard {
    let mut config = AiHubConfig::default();
    config.classifier.base_url = mock.base_url.clone();
    config.classifier.timeout_ms = 5_000;
    config.history.enabled = true;
    config.history.path = history_dir
        .join("history.jsonl")
        .to_string_lossy()
        .into_owned();
    Dashboard::new(&config)
}

fn json(reply: Reply) -> serde_json::Value {
    match reply {
        Reply::Json(200, value) => value,
        other => panic!("expected a 200 JSON reply, got {other:?}"),
    }
}

#[test]
fn upload_analyze_download_through_api() {
    let dir = common::scratch_dir("web-flow");
    let artifact = b"PK\x03\x04 classified";
    let mock = MockService::start(vec![
        MockResponse::json(200, UPLOAD_OK),
        MockResponse::json(200, ANALYZE_OK),
        MockResponse::bytes(artifact),
    ]);
    let mut d = dashboard(&mock, &dir);
    let csv = common::complaints_csv(250);

    let session = json(
        dispatch(&mut d, &Method::Post, "/api/upload", Some("complaints.csv"), csv.as_bytes())
            .unwrap(),
    );
    assert_eq!(session["stage"], "parsed");
    assert_eq!(session["data"]["total_rows"], 250);
    assert_eq!(session["data"]["rows"].as_array().unwrap().len(), 10);
    assert_eq!(session["overview"]["total_rows"], 250);

    let session = json(
        dispatch(&mut d, &Method::Post, "/api/column", None, br#"{"column":"text"}"#).unwrap(),
    );
    assert_eq!(session["selected_column"], "text");

    let session = json(dispatch(&mut d, &Method::Post, "/api/analyze", None, b"").unwrap());
    assert_eq!(session["stage"], "results");
    assert_eq!(session["result"]["filename"], "complaint_analysis_complaints.csv");
    assert_eq!(session["view"]["total_processed"], 250);
    assert_eq!(session["view"]["classes"][0]["percentage"], 36.0);
    assert_eq!(session["view"]["classes"][1]["percentage"], 64.0);
    assert_eq!(session["view"]["partition_consistent"], true);

    match dispatch(&mut d, &Method::Get, "/api/download", None, b"").unwrap() {
        Reply::File {
            file_name,
            content_type,
            bytes,
        } => {
            assert_eq!(file_name, "complaint_analysis_complaints.csv");
            assert_eq!(
                content_type,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            );
            assert_eq!(bytes, artifact);
        }
        other => panic!("expected a file reply, got {other:?}"),
    }

    let history = json(dispatch(&mut d, &Method::Get, "/api/history?days=7", None, b"").unwrap());
    assert_eq!(history["total_runs"], 1);
    assert_eq!(history["successful_runs"], 1);
    assert_eq!(history["total_processed"], 250);
    assert_eq!(history["files"][0]["file_name"], "complaints.csv");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn service_failure_is_bad_gateway_and_logged() {
    let dir = common::scratch_dir("web-failure");
    let mock = MockService::start(vec![MockResponse::json(
        503,
        r#"{"detail": "Model not initialized"}"#,
    )]);
    let mut d = dashboard(&mock, &dir);

    dispatch(
        &mut d,
        &Method::Post,
        "/api/upload",
        Some("complaints.csv"),
        common::complaints_csv(4).as_bytes(),
    )
    .unwrap();
    dispatch(&mut d, &Method::Post, "/api/column", None, br#"{"column":"text"}"#).unwrap();

    let err = dispatch(&mut d, &Method::Post, "/api/analyze", None, b"").unwrap_err();
    assert_eq!(error_status(&err), 502);
    assert!(format!("{err:#}").contains("Model not initialized"));

    let session = json(dispatch(&mut d, &Method::Get, "/api/session", None, b"").unwrap());
    assert_eq!(session["stage"], "error");
    assert_eq!(session["selected_column"], "text");

    let history = json(dispatch(&mut d, &Method::Get, "/api/history", None, b"").unwrap());
    assert_eq!(history["total_runs"], 1);
    assert_eq!(history["failed_runs"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rejected_analyze_touches_neither_service_nor_history() {
    let dir = common::scratch_dir("web-rejected");
    let mock = MockService::start(vec![MockResponse::json(200, UPLOAD_OK)]);
    let mut d = dashboard(&mock, &dir);

    let err = dispatch(&mut d, &Method::Post, "/api/analyze", None, b"").unwrap_err();
    assert_eq!(error_status(&err), 400);

    assert!(mock.requests().is_empty());
    let history = json(dispatch(&mut d, &Method::Get, "/api/history", None, b"").unwrap());
    assert_eq!(history["total_runs"], 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn status_is_proxied_with_poll_interval() {
    let dir = common::scratch_dir("web-status");
    let mock = MockService::start(vec![MockResponse::json(
        200,
        r#"{"status": "loading", "model_loaded": false}"#,
    )]);
    let mut d = dashboard(&mock, &dir);

    let status = json(dispatch(&mut d, &Method::Get, "/api/status", None, b"").unwrap());
    assert_eq!(status["status"], "loading");
    assert_eq!(status["poll_interval_secs"], 5);

    let _ = std::fs::remove_dir_all(&dir);
}
