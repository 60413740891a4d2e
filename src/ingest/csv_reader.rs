//! CSV grid reader.
//!
//! Uses the `csv` crate with headers disabled (the dataset builder decides
//! what the header row is), flexible record lengths, and full trimming.
//! Invalid UTF-8 is replaced rather than rejected so that Latin-1 exports
//! from Excel still load.

use csv::{ReaderBuilder, Trim};

use super::IngestError;

/// Parse CSV bytes into a grid of cell strings.
pub fn parse_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for (index, result) in reader.byte_records().enumerate() {
        let record = result
            .map_err(|e| IngestError::Malformed(format!("CSV row {}: {e}", index + 1)))?;
        grid.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_with_commas() {
        let grid = parse_grid(b"id,text\n1,\"late, and rude\"\n").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1], vec!["1", "late, and rude"]);
    }

    #[test]
    fn allows_ragged_rows() {
        let grid = parse_grid(b"a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(grid[1].len(), 1);
        assert_eq!(grid[2].len(), 4);
    }

    #[test]
    fn handles_crlf_and_whitespace() {
        let grid = parse_grid(b" id , text \r\n 7 ,  hello \r\n").unwrap();
        assert_eq!(grid[0], vec!["id", "text"]);
        assert_eq!(grid[1], vec!["7", "hello"]);
    }

    #[test]
    fn replaces_invalid_utf8() {
        let grid = parse_grid(b"name\ncaf\xe9\n").unwrap();
        assert!(grid[1][0].starts_with("caf"));
    }
}
