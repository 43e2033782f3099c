//! Content extraction for the supported document families.
//!
//! An extractor turns a file path into searchable [`Content`]: the Excel
//! extractor produces a decoded [`Workbook`], the Word extractor a single text
//! blob. Both consult the shared [`CacheStore`](crate::cache::CacheStore)
//! first and only read and decode the file on a miss.
//!
//! The format parsing itself sits behind [`WorkbookDecoder`] and
//! [`TextDecoder`] so the engine can be driven with other decoders (tests
//! count decode calls this way).

mod excel;
pub(crate) mod legacy;
mod word;

pub use excel::{CalamineDecoder, ExcelExtractor};
pub use legacy::extract_doc_text;
pub use word::{OfficeTextDecoder, WordExtractor};

use std::path::Path;
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};
use crate::filters::{Classified, FileKind, WordFormat};

/// A decoded spreadsheet: sheets in workbook order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// One worksheet as a grid of string-coerced cells.
///
/// `rows[r][c]` is the cell at zero-based sheet position
/// `(first_row + r, first_column + c)`; the grid covers the used range only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub first_row: usize,
    pub first_column: usize,
    pub rows: Vec<Vec<String>>,
}

/// A non-empty cell with 1-based coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub sheet: &'a str,
    pub row: usize,
    pub column: usize,
    pub text: &'a str,
}

impl Sheet {
    /// Builds a sheet whose grid starts at `A1`
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            first_row: 0,
            first_column: 0,
            rows,
        }
    }

    /// Non-empty cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> {
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, text)| !text.is_empty())
                .map(move |(c, text)| CellRef {
                    sheet: &self.name,
                    row: self.first_row + r + 1,
                    column: self.first_column + c + 1,
                    text,
                })
        })
    }
}

impl Workbook {
    /// Non-empty cells of every sheet, sheet by sheet
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> {
        self.sheets.iter().flat_map(|sheet| sheet.cells())
    }
}

/// Searchable content of one file
#[derive(Debug, Clone)]
pub enum Content {
    Workbook(Arc<Workbook>),
    Text(Arc<str>),
}

/// Produces searchable content for one family of documents
pub trait ContentExtractor: Send + Sync {
    /// The document family this extractor handles
    fn kind(&self) -> FileKind;

    /// Extracts `path`, consulting and filling the cache when `use_cache` is set
    fn extract(&self, path: &Path, file: Classified, use_cache: bool) -> SearchResult<Content>;
}

/// Decodes raw spreadsheet bytes
pub trait WorkbookDecoder: Send + Sync {
    fn decode_workbook(&self, path: &Path, bytes: Vec<u8>) -> SearchResult<Workbook>;
}

/// Extracts plain text from raw Word document bytes
pub trait TextDecoder: Send + Sync {
    fn decode_text(&self, path: &Path, bytes: Vec<u8>, format: WordFormat) -> SearchResult<String>;
}

/// Reads a whole file, mapping failures to [`SearchError::FileRead`]
pub(crate) fn read_file(path: &Path) -> SearchResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| SearchError::file_read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cells_skip_empty_and_are_one_based() {
        let sheet = Sheet::from_rows("Sheet1", vec![row(&["a", ""]), row(&["", "b"])]);
        let cells: Vec<_> = sheet.cells().map(|c| (c.row, c.column, c.text)).collect();
        assert_eq!(cells, vec![(1, 1, "a"), (2, 2, "b")]);
    }

    #[test]
    fn test_cells_honor_range_origin() {
        let sheet = Sheet {
            name: "Data".to_string(),
            first_row: 2,
            first_column: 1,
            rows: vec![row(&["Invoice 2024"])],
        };
        let cell = sheet.cells().next().unwrap();
        assert_eq!(cell.sheet, "Data");
        assert_eq!((cell.row, cell.column), (3, 2));
    }

    #[test]
    fn test_workbook_cells_in_sheet_order() {
        let workbook = Workbook {
            sheets: vec![
                Sheet::from_rows("First", vec![row(&["x"])]),
                Sheet::from_rows("Second", vec![row(&["y"])]),
            ],
        };
        let sheets: Vec<_> = workbook.cells().map(|c| c.sheet).collect();
        assert_eq!(sheets, vec!["First", "Second"]);
    }
}
