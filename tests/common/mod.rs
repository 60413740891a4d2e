//! Scripted stand-in for the classifier service.
//!
//! Binds `127.0.0.1:0`, answers the scripted responses in order from a
//! background thread, and records every request it saw.

#![allow(dead_code)]

use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};

/// One canned reply.
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
        }
    }
}

/// A request as the service received it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn body_contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|w| w == needle)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

pub struct MockService {
    pub base_url: String,
    captured: mpsc::Receiver<Captured>,
}

impl MockService {
    pub fn start(responses: Vec<MockResponse>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock service");
        let port = server
            .server_addr()
            .to_ip()
            .expect("mock service listens on TCP")
            .port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for response in responses {
                let mut request = match server.recv_timeout(Duration::from_secs(10)) {
                    Ok(Some(request)) => request,
                    _ => break,
                };

                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);
                let content_type = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Content-Type"))
                    .map(|h| h.value.as_str().to_string());

                let _ = tx.send(Captured {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    content_type,
                    body,
                });

                let reply = Response::from_data(response.body)
                    .with_status_code(StatusCode(response.status))
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("static header"),
                    );
                let _ = request.respond(reply);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            captured: rx,
        }
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.try_iter().collect()
    }

    /// URLs of the requests received so far.
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

/// A fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "aihub-it-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// `id,text,channel` CSV with `rows` data rows.
pub fn complaints_csv(rows: usize) -> String {
    let mut csv = String::from("id,text,channel\n");
    for i in 1..=rows {
        let channel = if i % 2 == 0 { "email" } else { "phone" };
        csv.push_str(&format!("{i},\"Feedback message number {i}\",{channel}\n"));
    }
    csv
}

pub const UPLOAD_OK: &str =
    r#"{"success": true, "file_id": "f-250", "columns": ["id", "text", "channel"], "total_rows": 250}"#;

pub const ANALYZE_OK: &str = r#"{"success": true, "result_id": "r-250", "summary": {
    "complaintCount": 90, "nonComplaintCount": 160, "totalProcessed": 250,
    "accuracy": 92.4, "averageConfidence": 0.88, "processingTime": 3.2}}"#;
