//! Embedded web dashboard for aihub.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard driving the upload → analyze → download workflow
//! - JSON API endpoints backed by one server-side [`Workflow`] session
//!
//! Launched via `aihub web` (default: `http://127.0.0.1:9747`).

pub mod api;
mod frontend;

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::classifier::ClassifierClient;
use crate::config::AiHubConfig;
use crate::history::HistoryLog;
use crate::ingest::SpreadsheetParser;
use crate::workflow::{Workflow, WorkflowError};

use api::Reply;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: u64 = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything the dashboard needs between requests. Requests are handled
/// one at a time, so the session needs no locking.
pub struct Dashboard {
    pub(crate) client: ClassifierClient,
    pub(crate) workflow: Workflow,
    pub(crate) history: HistoryLog,
    pub(crate) config: AiHubConfig,
}

impl Dashboard {
    pub fn new(config: &AiHubConfig) -> Self {
        Self {
            client: ClassifierClient::new(&config.classifier),
            workflow: Workflow::new(SpreadsheetParser::from_config(&config.upload)),
            history: HistoryLog::from_config(&config.history),
            config: config.clone(),
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on `config.web.addr`.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Errors are reported per request without
/// stopping the server.
pub fn serve(config: &AiHubConfig) -> Result<()> {
    let addr = config.web.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("aihub dashboard running at http://{addr}");
    println!("Classifier service: {}", config.classifier.base_url);
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    let mut dashboard = Dashboard::new(config);
    for request in server.incoming_requests() {
        handle_request(&mut dashboard, request);
    }

    Ok(())
}

fn handle_request(dashboard: &mut Dashboard, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let file_name = header_value(&request, "X-File-Name");

    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        read_body(&mut request)
    } else {
        Ok(Vec::new())
    };

    let (status, response) = match body {
        Err(e) => {
            let status = 400;
            (status, json_error(status, &format!("failed to read request body: {e}")))
        }
        Ok(body) if body.len() as u64 > MAX_UPLOAD_BYTES => {
            let status = 413;
            let message = format!("upload exceeds {} MB", MAX_UPLOAD_BYTES / (1024 * 1024));
            (status, json_error(status, &message))
        }
        Ok(body) => match dispatch(dashboard, &method, &url, file_name.as_deref(), &body) {
            Ok(reply) => (reply.status(), into_response(reply)),
            Err(e) => {
                let status = error_status(&e);
                (status, json_error(status, &format!("{e:#}")))
            }
        },
    };

    let _ = request.respond(response);

    // Brief access log
    println!(
        "{} {} {} {}",
        method,
        url,
        status,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to its handler.
pub fn dispatch(
    dashboard: &mut Dashboard,
    method: &Method,
    url: &str,
    file_name: Option<&str>,
    body: &[u8],
) -> Result<Reply> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Ok(Reply::Html(frontend::INDEX_HTML))
        }

        // API: classifier model
        (&Method::Get, "/api/status") => api::get_status(dashboard),
        (&Method::Get, "/api/health") => api::get_health(dashboard),
        (&Method::Post, "/api/initialize") => api::post_initialize(dashboard),

        // API: workflow
        (&Method::Get, "/api/session") => api::get_session(dashboard),
        (&Method::Post, "/api/upload") => api::post_upload(dashboard, file_name, body),
        (&Method::Post, "/api/column") => api::post_column(dashboard, body),
        (&Method::Post, "/api/analyze") => api::post_analyze(dashboard),
        (&Method::Post, "/api/reset") => api::post_reset(dashboard),
        (&Method::Get, "/api/download") => api::get_download(dashboard),

        // API: history
        (&Method::Get, "/api/history") => api::get_history(dashboard, url),

        // 404
        _ => Ok(Reply::Json(404, serde_json::json!({ "error": "not found" }))),
    }
}

/// HTTP status for a handler error.
///
/// Client-side workflow rejections are 400, classifier failures 502, and
/// anything else 500.
pub fn error_status(err: &anyhow::Error) -> u16 {
    match err.downcast_ref::<WorkflowError>() {
        Some(WorkflowError::Remote(_)) => 502,
        Some(_) => 400,
        None => 500,
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn into_response(reply: Reply) -> Response<Cursor<Vec<u8>>> {
    match reply {
        Reply::Html(html) => Response::from_data(html.as_bytes().to_vec())
            .with_header(content_type_html())
            .with_status_code(StatusCode(200)),
        Reply::Json(status, value) => Response::from_data(value.to_string().into_bytes())
            .with_header(content_type_json())
            .with_status_code(StatusCode(status)),
        Reply::File {
            file_name,
            content_type,
            bytes,
        } => {
            let mut resp = Response::from_data(bytes).with_status_code(StatusCode(200));
            if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
                resp = resp.with_header(header);
            }
            if let Ok(header) = content_disposition(&file_name) {
                resp = resp.with_header(header);
            }
            resp
        }
    }
}

fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// Read a request body, up to one byte past the upload cap.
///
/// A body cut short by the client is an error, never a partial upload.
fn read_body(request: &mut Request) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    read_capped(request.as_reader(), &mut buf)?;
    Ok(buf)
}

fn read_capped(reader: impl Read, buf: &mut Vec<u8>) -> std::io::Result<usize> {
    reader.take(MAX_UPLOAD_BYTES + 1).read_to_end(buf)
}

/// First value of a request header, percent-decoded.
fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| api::percent_decode(h.value.as_str()))
}

/// `attachment; filename="..."` with quotes and non-ASCII replaced.
fn content_disposition(file_name: &str) -> Result<Header> {
    let safe: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    Header::from_bytes(
        "Content-Disposition",
        format!("attachment; filename=\"{safe}\""),
    )
    .map_err(|_| anyhow::anyhow!("invalid download file name"))
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header must be valid")
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .expect("static header must be valid")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
