use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{read_file, Content, ContentExtractor, Sheet, Workbook, WorkbookDecoder};
use crate::cache::CacheStore;
use crate::errors::{SearchError, SearchResult};
use crate::filters::{Classified, FileKind};
use crate::metrics::ScanMetrics;

/// Decodes `.xls` and `.xlsx` workbooks with calamine
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineDecoder;

impl WorkbookDecoder for CalamineDecoder {
    fn decode_workbook(&self, path: &Path, bytes: Vec<u8>) -> SearchResult<Workbook> {
        let mut source = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| SearchError::decode(path, e.to_string()))?;

        let mut workbook = Workbook::default();
        for name in source.sheet_names().to_vec() {
            let range = match source.worksheet_range(&name) {
                Ok(range) => range,
                Err(e) => {
                    // Chart sheets and macro sheets have no cell range
                    debug!("Skipping sheet '{}' in {}: {}", name, path.display(), e);
                    continue;
                }
            };

            let (first_row, first_column) = range.start().unwrap_or((0, 0));
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect();

            workbook.sheets.push(Sheet {
                name,
                first_row: first_row as usize,
                first_column: first_column as usize,
                rows,
            });
        }

        Ok(workbook)
    }
}

/// Coerces a cell to the text a user would see in the grid
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => general_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string().to_uppercase(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => date_text(dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Rounds to the 15 significant digits Excel displays
fn general_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    format!("{:.14e}", value)
        .parse::<f64>()
        .unwrap_or(value)
        .to_string()
}

/// Dates as `YYYY-MM-DD`, with `HH:MM:SS` when the time is set; durations as `[h]:mm:ss`
fn date_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        let total = (dt.as_f64() * 86_400.0).round() as i64;
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        return format!(
            "{}{}:{:02}:{:02}",
            sign,
            total / 3600,
            total % 3600 / 60,
            total % 60
        );
    }

    let (year, month, day, hour, minute, second, _) = dt.to_ymd_hms_milli();
    if (hour, minute, second) == (0, 0, 0) {
        format!("{:04}-{:02}-{:02}", year, month, day)
    } else {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        )
    }
}

/// Extracts workbooks, sharing decoded results through the excel cache
pub struct ExcelExtractor {
    cache: Arc<CacheStore>,
    decoder: Arc<dyn WorkbookDecoder>,
    metrics: ScanMetrics,
}

impl ExcelExtractor {
    pub fn new(
        cache: Arc<CacheStore>,
        decoder: Arc<dyn WorkbookDecoder>,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            cache,
            decoder,
            metrics,
        }
    }

    fn load(&self, path: &Path, use_cache: bool) -> SearchResult<Arc<Workbook>> {
        if use_cache {
            if let Some(workbook) = self.cache.excel.get(path) {
                trace!("Workbook cache hit: {}", path.display());
                return Ok(workbook);
            }
        }

        let bytes = read_file(path)?;
        self.metrics.record_decode(FileKind::Excel, bytes.len() as u64);
        let workbook = Arc::new(self.decoder.decode_workbook(path, bytes)?);

        if use_cache {
            self.cache.excel.set(path.to_path_buf(), Arc::clone(&workbook));
        }
        Ok(workbook)
    }
}

impl ContentExtractor for ExcelExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Excel
    }

    fn extract(&self, path: &Path, _file: Classified, use_cache: bool) -> SearchResult<Content> {
        self.load(path, use_cache).map(Content::Workbook)
    }
}
