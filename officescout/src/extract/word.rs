use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

use super::{read_file, Content, ContentExtractor, TextDecoder};
use crate::cache::CacheStore;
use crate::errors::{SearchError, SearchResult};
use crate::extract::legacy::extract_doc_text;
use crate::filters::{Classified, FileKind, WordFormat};
use crate::metrics::ScanMetrics;

/// Separator between paragraphs in extracted `.docx` text
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Text extraction for both Word containers: docx-rs for `.docx`, the
/// piece-table reader in [`extract_doc_text`] for `.doc`
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficeTextDecoder;

impl TextDecoder for OfficeTextDecoder {
    fn decode_text(&self, path: &Path, bytes: Vec<u8>, format: WordFormat) -> SearchResult<String> {
        match format {
            WordFormat::Docx => {
                let docx = read_docx(&bytes).map_err(|e| SearchError::decode(path, e.to_string()))?;
                let mut paragraphs = Vec::new();
                for child in &docx.document.children {
                    collect_document_child(child, &mut paragraphs);
                }
                Ok(paragraphs.join(PARAGRAPH_SEPARATOR))
            }
            WordFormat::Doc => extract_doc_text(&bytes).map_err(|detail| {
                SearchError::decode(
                    path,
                    format!(
                        "could not read legacy Word file, it may be an older Word format or damaged: {}",
                        detail
                    ),
                )
            }),
        }
    }
}

fn collect_document_child(child: &DocumentChild, paragraphs: &mut Vec<String>) {
    match child {
        DocumentChild::Paragraph(paragraph) => paragraphs.push(paragraph_text(paragraph)),
        DocumentChild::Table(table) => collect_table(table, paragraphs),
        _ => {}
    }
}

#[allow(irrefutable_let_patterns)]
fn collect_table(table: &Table, paragraphs: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row else {
            continue;
        };
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        paragraphs.push(paragraph_text(paragraph))
                    }
                    TableCellContent::Table(nested) => collect_table(nested, paragraphs),
                    _ => {}
                }
            }
        }
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        push_paragraph_child(child, &mut text);
    }
    text
}

fn push_paragraph_child(child: &ParagraphChild, text: &mut String) {
    match child {
        ParagraphChild::Run(run) => push_run(run, text),
        ParagraphChild::Hyperlink(link) => {
            for child in &link.children {
                push_paragraph_child(child, text);
            }
        }
        _ => {}
    }
}

fn push_run(run: &Run, text: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

/// Extracts document text, sharing results through the word cache
pub struct WordExtractor {
    cache: Arc<CacheStore>,
    decoder: Arc<dyn TextDecoder>,
    metrics: ScanMetrics,
}

impl WordExtractor {
    pub fn new(cache: Arc<CacheStore>, decoder: Arc<dyn TextDecoder>, metrics: ScanMetrics) -> Self {
        Self {
            cache,
            decoder,
            metrics,
        }
    }

    fn load(&self, path: &Path, format: WordFormat, use_cache: bool) -> SearchResult<Arc<str>> {
        if use_cache {
            if let Some(text) = self.cache.word.get(path) {
                trace!("Text cache hit: {}", path.display());
                return Ok(text);
            }
        }

        let bytes = read_file(path)?;
        self.metrics.record_decode(FileKind::Word, bytes.len() as u64);
        let text: Arc<str> = Arc::from(self.decoder.decode_text(path, bytes, format)?);

        if use_cache {
            self.cache.word.set(path.to_path_buf(), Arc::clone(&text));
        }
        Ok(text)
    }
}

impl ContentExtractor for WordExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Word
    }

    fn extract(&self, path: &Path, file: Classified, use_cache: bool) -> SearchResult<Content> {
        let format = match file {
            Classified::Word(format) => format,
            Classified::Excel => {
                return Err(SearchError::decode(path, "not a Word document"));
            }
        };
        self.load(path, format, use_cache).map(Content::Text)
    }
}
