use std::path::Path;
use std::sync::Arc;
use tracing::trace;

use super::markup::MarkupPolicy;
use super::matcher::KeywordMatcher;
use crate::errors::SearchResult;
use crate::extract::{Content, ContentExtractor, Workbook};
use crate::filters::{Classified, FileKind, WordFormat};
use crate::results::MatchRecord;

/// Turns one classified file into match records
pub struct FileProcessor {
    excel: Arc<dyn ContentExtractor>,
    word: Arc<dyn ContentExtractor>,
    matcher: KeywordMatcher,
    markup_policy: Option<MarkupPolicy>,
}

impl FileProcessor {
    pub fn new(
        excel: Arc<dyn ContentExtractor>,
        word: Arc<dyn ContentExtractor>,
        matcher: KeywordMatcher,
    ) -> Self {
        Self {
            excel,
            word,
            matcher,
            markup_policy: None,
        }
    }

    /// Drops legacy Word windows for which `policy` returns true
    pub fn with_markup_policy(mut self, policy: Option<MarkupPolicy>) -> Self {
        self.markup_policy = policy;
        self
    }

    /// Extracts `path` and matches it.
    ///
    /// Either the whole file yields its records or an error is returned; no
    /// partial record list escapes a failure.
    pub fn process(
        &self,
        path: &Path,
        file: Classified,
        use_cache: bool,
    ) -> SearchResult<Vec<MatchRecord>> {
        let extractor = match file.kind() {
            FileKind::Excel => &self.excel,
            FileKind::Word => &self.word,
        };
        debug_assert_eq!(extractor.kind(), file.kind());

        let records = match extractor.extract(path, file, use_cache)? {
            Content::Workbook(workbook) => self.match_workbook(path, &workbook),
            Content::Text(text) => self.match_text(path, &text, file),
        };
        trace!("{} records in {}", records.len(), path.display());
        Ok(records)
    }

    fn match_workbook(&self, path: &Path, workbook: &Workbook) -> Vec<MatchRecord> {
        let mut records = Vec::new();
        for cell in workbook.cells() {
            for keyword in self.matcher.find_in_cell(cell.text) {
                records.push(MatchRecord::Excel {
                    file: path.to_path_buf(),
                    sheet: cell.sheet.to_string(),
                    row: cell.row,
                    column: cell.column,
                    content: cell.text.to_string(),
                    keyword: keyword.to_string(),
                });
            }
        }
        records
    }

    fn match_text(&self, path: &Path, text: &str, file: Classified) -> Vec<MatchRecord> {
        let policy = match file {
            Classified::Word(WordFormat::Doc) => self.markup_policy,
            _ => None,
        };

        self.matcher
            .find_in_text(text)
            .into_iter()
            .filter(|m| !policy.is_some_and(|looks_like_markup| looks_like_markup(&m.context)))
            .map(|m| MatchRecord::Word {
                file: path.to_path_buf(),
                content: m.context,
                keyword: m.keyword.to_string(),
                position: m.position,
            })
            .collect()
    }
}
