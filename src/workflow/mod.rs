//! Upload → analyze → download workflow as an explicit state machine.
//!
//! ```text
//! Idle ──select_file──▶ FileSelected ──parse──▶ Parsed ──select_column──▶ ColumnSelected
//!                                                                             │
//!                                               Results ◀──ok── Analyzing ◀──analyze
//!                                                                   │
//!                                                                   └─err──▶ Error
//! reset: any stage ──▶ Idle
//! ```
//!
//! All preconditions are checked locally before the classifier is called:
//! an unsupported extension, a missing file, or a missing/unknown column
//! never reaches the network. After an error the user simply re-triggers the
//! action; nothing is retried automatically.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::{AnalysisSummary, ClassifierApi, UploadResponse};
use crate::ingest::{IngestError, SpreadsheetParser, UploadedData};
use crate::report;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    FileSelected,
    Parsed,
    ColumnSelected,
    Analyzing,
    Results,
    Error,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FileSelected => "file selected",
            Self::Parsed => "parsed",
            Self::ColumnSelected => "column selected",
            Self::Analyzing => "analyzing",
            Self::Results => "results",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Reasons an action was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("please upload a file first")]
    NoFile,
    #[error("please select a column containing the text data")]
    NoColumn,
    #[error("column '{0}' is not in the uploaded file")]
    UnknownColumn(String),
    #[error("no analysis results yet")]
    NoResults,
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// Outcome of one successful analyze call. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub file_id: String,
    pub result_id: String,
    pub text_column: String,
    /// Suggested download file name.
    pub filename: String,
    pub completed_at: DateTime<Utc>,
}

/// The file the user picked, kept in memory for upload.
#[derive(Debug, Clone)]
struct SelectedFile {
    name: String,
    bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// One user's upload-analyze-download session.
#[derive(Debug)]
pub struct Workflow {
    parser: SpreadsheetParser,
    stage: Stage,
    file: Option<SelectedFile>,
    data: Option<UploadedData>,
    column: Option<String>,
    uploaded: Option<UploadResponse>,
    result: Option<AnalysisResult>,
    last_error: Option<String>,
}

impl Workflow {
    pub fn new(parser: SpreadsheetParser) -> Self {
        Self {
            parser,
            stage: Stage::Idle,
            file: None,
            data: None,
            column: None,
            uploaded: None,
            result: None,
            last_error: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    pub fn data(&self) -> Option<&UploadedData> {
        self.data.as_ref()
    }

    pub fn selected_column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Back to `Idle`, dropping the file, data, column, and results.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.file = None;
        self.data = None;
        self.column = None;
        self.uploaded = None;
        self.result = None;
        self.last_error = None;
    }

    /// Read a file from disk and select it. The extension is checked before
    /// the file is opened.
    pub fn select_path(&mut self, path: &Path) -> Result<&UploadedData, WorkflowError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if let Err(e) = self.parser.check_extension(&name) {
            return Err(self.fail_selection(e.into()));
        }
        match fs::read(path) {
            Ok(bytes) => self.select_file(&name, bytes),
            Err(e) => Err(self.fail_selection(IngestError::from(e).into())),
        }
    }

    /// Select an in-memory upload and parse it. Replaces any previous file
    /// and clears the column and results.
    pub fn select_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<&UploadedData, WorkflowError> {
        self.reset();

        if let Err(e) = self.parser.check_extension(name) {
            return Err(self.fail_selection(e.into()));
        }

        self.stage = Stage::FileSelected;
        match self.parser.parse_bytes(name, &bytes) {
            Ok(data) => {
                self.file = Some(SelectedFile {
                    name: name.to_string(),
                    bytes,
                });
                self.stage = Stage::Parsed;
                Ok(self.data.insert(data))
            }
            Err(e) => Err(self.fail_selection(e.into())),
        }
    }

    /// Choose the text column to classify.
    pub fn select_column(&mut self, column: &str) -> Result<(), WorkflowError> {
        let data = self.data.as_ref().ok_or(WorkflowError::NoFile)?;
        if data.column_index(column).is_none() {
            return Err(WorkflowError::UnknownColumn(column.to_string()));
        }

        self.column = Some(column.to_string());
        self.result = None;
        self.last_error = None;
        self.stage = Stage::ColumnSelected;
        Ok(())
    }

    /// Upload (once per file) and classify the selected column.
    ///
    /// Refused without any call to `api` when there is no parsed file or no
    /// selected column.
    pub fn analyze(&mut self, api: &dyn ClassifierApi) -> Result<&AnalysisResult, WorkflowError> {
        let file = self.file.as_ref().ok_or(WorkflowError::NoFile)?;
        if self.data.is_none() {
            return Err(WorkflowError::NoFile);
        }
        let column = self.column.clone().ok_or(WorkflowError::NoColumn)?;
        let file_name = file.name.clone();

        self.stage = Stage::Analyzing;
        self.result = None;
        self.last_error = None;

        let cached = self.uploaded.as_ref().map(|u| u.file_id.clone());
        let file_id = match cached {
            Some(id) => id,
            None => match api.upload_file(&file.name, &file.bytes) {
                Ok(upload) => {
                    let id = upload.file_id.clone();
                    self.uploaded = Some(upload);
                    id
                }
                Err(e) => return Err(self.fail_analysis(e)),
            },
        };

        match api.analyze_file(&file_id, &column) {
            Ok(response) => {
                self.stage = Stage::Results;
                Ok(self.result.insert(AnalysisResult {
                    summary: response.summary,
                    file_id,
                    result_id: response.result_id,
                    text_column: column,
                    filename: report::download_file_name(&file_name),
                    completed_at: Utc::now(),
                }))
            }
            Err(e) => Err(self.fail_analysis(e)),
        }
    }

    /// Fetch the result artifact for the current results.
    ///
    /// Returns the suggested file name and the bytes.
    pub fn download(&self, api: &dyn ClassifierApi) -> Result<(String, Vec<u8>), WorkflowError> {
        let result = self.result.as_ref().ok_or(WorkflowError::NoResults)?;
        let bytes = api.download(&result.result_id)?;
        Ok((result.filename.clone(), bytes))
    }

    fn fail_selection(&mut self, err: WorkflowError) -> WorkflowError {
        self.file = None;
        self.data = None;
        self.stage = Stage::Error;
        self.last_error = Some(err.to_string());
        err
    }

    /// Analysis failures keep the file and column so the user can retry.
    fn fail_analysis(&mut self, err: anyhow::Error) -> WorkflowError {
        self.stage = Stage::Error;
        self.last_error = Some(format!("{err:#}"));
        WorkflowError::Remote(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
