//! Spreadsheet ingestion: turn an uploaded `.csv` / `.xlsx` / `.xls` file
//! into headers, a bounded preview, and the full row set.
//!
//! The extension gate runs before anything is read, so unsupported files are
//! rejected without touching the disk or the network. Parsing is delegated
//! to [`csv_reader`] (the `csv` crate) and [`excel`] (`calamine`); both produce a
//! plain grid of strings which [`build_dataset`] shapes into
//! [`UploadedData`].

pub mod csv_reader;
pub mod excel;
pub mod stats;

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::schema::UploadConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a file could not be turned into [`UploadedData`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unsupported file format: {file_name} (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat { file_name: String },
    #[error("file is empty")]
    Empty,
    #[error("could not parse file: {0}")]
    Malformed(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// File kinds
// ---------------------------------------------------------------------------

/// Spreadsheet formats understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    /// Map a lowercase extension (without the dot) to a file kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Xlsx => write!(f, "xlsx"),
            Self::Xls => write!(f, "xls"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed data
// ---------------------------------------------------------------------------

/// A parsed spreadsheet.
///
/// `rows` is the preview (at most `preview_rows` records); `total_rows`
/// counts every data row in the source. Every row, preview or not, has
/// exactly `headers.len()` cells.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedData {
    pub file_name: String,
    pub kind: FileKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    #[serde(skip)]
    all_rows: Vec<Vec<String>>,
}

impl UploadedData {
    /// Every data row in the file, not just the preview.
    pub fn all_rows(&self) -> &[Vec<String>] {
        &self.all_rows
    }

    /// Index of a header by exact name (first match wins, since headers are
    /// not required to be unique).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Upper bound on preview rows, whatever the config asks for.
pub const MAX_PREVIEW_ROWS: usize = 10;

/// Spreadsheet parser configured from the `[upload]` config section.
#[derive(Debug, Clone)]
pub struct SpreadsheetParser {
    preview_rows: usize,
    allowed_extensions: Vec<String>,
}

impl Default for SpreadsheetParser {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl SpreadsheetParser {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            preview_rows: config.preview_rows.clamp(1, MAX_PREVIEW_ROWS),
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Maximum number of preview rows this parser keeps.
    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Extension gate: decide the file kind from the name alone.
    ///
    /// Content is never sniffed. An extension must be both known to the
    /// parser and listed in `allowed_extensions`.
    pub fn check_extension(&self, file_name: &str) -> Result<FileKind, IngestError> {
        let unsupported = || IngestError::UnsupportedFormat {
            file_name: file_name.to_string(),
        };

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(unsupported)?;

        if !self.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(unsupported());
        }

        FileKind::from_extension(&ext).ok_or_else(unsupported)
    }

    /// Read and parse a file from disk.
    pub fn parse_path(&self, path: &Path) -> Result<UploadedData, IngestError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.check_extension(&file_name)?;

        let bytes = fs::read(path)?;
        self.parse_bytes(&file_name, &bytes)
    }

    /// Parse an in-memory upload.
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<UploadedData, IngestError> {
        let kind = self.check_extension(file_name)?;
        if bytes.is_empty() {
            return Err(IngestError::Empty);
        }

        let grid = match kind {
            FileKind::Csv => csv_reader::parse_grid(bytes)?,
            FileKind::Xlsx | FileKind::Xls => excel::parse_grid(kind, bytes)?,
        };

        build_dataset(file_name, kind, grid, self.preview_rows)
    }
}

/// Shape a raw grid into [`UploadedData`].
///
/// The first non-blank row becomes the headers. Cells are trimmed and every
/// data row is padded or truncated to the header width. Blank data rows are
/// dropped for CSV only; a blank row inside an Excel sheet is kept and
/// counted.
pub fn build_dataset(
    file_name: &str,
    kind: FileKind,
    grid: Vec<Vec<String>>,
    preview_rows: usize,
) -> Result<UploadedData, IngestError> {
    let is_blank = |row: &Vec<String>| row.iter().all(|c| c.is_empty());

    let mut grid = grid
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.trim().to_string()).collect::<Vec<_>>())
        .skip_while(is_blank);

    let headers = grid.next().ok_or(IngestError::Empty)?;
    let width = headers.len();

    let all_rows: Vec<Vec<String>> = grid
        .filter(|row| kind != FileKind::Csv || !is_blank(row))
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();

    Ok(UploadedData {
        file_name: file_name.to_string(),
        kind,
        rows: all_rows
            .iter()
            .take(preview_rows.min(MAX_PREVIEW_ROWS))
            .cloned()
            .collect(),
        total_rows: all_rows.len(),
        headers,
        all_rows,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
