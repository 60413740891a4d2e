//! Excel grid reader (`.xlsx` and legacy `.xls`) via `calamine`.
//!
//! Workbooks are opened from an in-memory cursor; only the first worksheet
//! is read. Cells are rendered through their display form, so numbers come
//! out as `42` / `3.5`, booleans as `true`, and empty cells as `""`.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Range, Reader, Xls, Xlsx};

use super::{FileKind, IngestError};

/// Parse workbook bytes into a grid of cell strings.
pub fn parse_grid(kind: FileKind, bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    let cursor = Cursor::new(bytes);
    let range = match kind {
        FileKind::Xlsx => first_sheet(open::<Xlsx<_>, _>(cursor)?)?,
        FileKind::Xls => first_sheet(open::<Xls<_>, _>(cursor)?)?,
        FileKind::Csv => {
            return Err(IngestError::Malformed(
                "CSV content passed to the Excel reader".to_string(),
            ));
        }
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn open<W, RS>(reader: RS) -> Result<W, IngestError>
where
    RS: Read + Seek,
    W: Reader<RS>,
    W::Error: std::fmt::Display,
{
    W::new(reader).map_err(|e| IngestError::Malformed(format!("failed to open workbook: {e}")))
}

fn first_sheet<W, RS>(mut workbook: W) -> Result<Range<Data>, IngestError>
where
    RS: Read + Seek,
    W: Reader<RS>,
    W::Error: std::fmt::Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::Empty)?
        .map_err(|e| IngestError::Malformed(format!("failed to read worksheet: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 1, " text ").unwrap();
        sheet.write_number(1, 0, 1).unwrap();
        sheet.write_string(1, 1, "Package arrived broken").unwrap();
        sheet.write_number(2, 0, 2.5).unwrap();
        sheet.write_string(2, 1, "Thanks for the quick reply").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn reads_first_sheet_as_strings() {
        let grid = parse_grid(FileKind::Xlsx, &workbook_bytes()).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][0], "id");
        assert_eq!(grid[1][0], "1");
        assert_eq!(grid[2][0], "2.5");
        assert_eq!(grid[2][1], "Thanks for the quick reply");
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let result = parse_grid(FileKind::Xlsx, b"definitely not a zip archive");
        assert!(matches!(result, Err(IngestError::Malformed(_))));

        let result = parse_grid(FileKind::Xls, b"definitely not an OLE file");
        assert!(matches!(result, Err(IngestError::Malformed(_))));
    }
}
