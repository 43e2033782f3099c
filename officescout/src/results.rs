use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::events::ErrorEvent;
use crate::filters::FileKind;

/// One keyword hit.
///
/// Serializes with a `type` tag (`"excel"` or `"word"`) next to the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatchRecord {
    Excel {
        file: PathBuf,
        sheet: String,
        /// 1-based row
        row: usize,
        /// 1-based column
        column: usize,
        /// Full text of the matching cell
        content: String,
        keyword: String,
    },
    Word {
        file: PathBuf,
        /// Text around the hit, see [`CONTEXT_CHARS`](crate::search::matcher::CONTEXT_CHARS)
        content: String,
        keyword: String,
        /// 0-based character offset in the extracted text
        position: usize,
    },
}

impl MatchRecord {
    pub fn file(&self) -> &Path {
        match self {
            MatchRecord::Excel { file, .. } | MatchRecord::Word { file, .. } => file,
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            MatchRecord::Excel { keyword, .. } | MatchRecord::Word { keyword, .. } => keyword,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            MatchRecord::Excel { content, .. } | MatchRecord::Word { content, .. } => content,
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            MatchRecord::Excel { .. } => FileKind::Excel,
            MatchRecord::Word { .. } => FileKind::Word,
        }
    }
}

/// Everything a finished search produced
#[derive(Debug, Clone, Default)]
pub struct SearchOutput {
    /// Match records in arrival order
    pub records: Vec<MatchRecord>,
    /// Per-file and per-directory failures in arrival order
    pub errors: Vec<ErrorEvent>,
    /// Eligible files found by the count pass
    pub files_total: usize,
    /// Eligible files handled by the process pass, failed ones included
    pub files_processed: usize,
    pub files_failed: usize,
    pub elapsed: Duration,
}

impl SearchOutput {
    /// Creates a new empty search output
    pub fn new() -> Self {
        Default::default()
    }

    pub fn total_matches(&self) -> usize {
        self.records.len()
    }

    /// Number of distinct files with at least one record
    pub fn files_with_matches(&self) -> usize {
        self.records
            .iter()
            .map(MatchRecord::file)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(file: &str, keyword: &str, position: usize) -> MatchRecord {
        MatchRecord::Word {
            file: PathBuf::from(file),
            content: format!("... {} ...", keyword),
            keyword: keyword.to_string(),
            position,
        }
    }

    #[test]
    fn test_record_accessors() {
        let record = MatchRecord::Excel {
            file: PathBuf::from("book.xlsx"),
            sheet: "Sheet1".to_string(),
            row: 3,
            column: 2,
            content: "Invoice 2024".to_string(),
            keyword: "2024".to_string(),
        };
        assert_eq!(record.file(), Path::new("book.xlsx"));
        assert_eq!(record.keyword(), "2024");
        assert_eq!(record.content(), "Invoice 2024");
        assert_eq!(record.kind(), FileKind::Excel);
    }

    #[test]
    fn test_record_json_is_tagged() {
        let json = serde_json::to_value(word("memo.docx", "fox", 16)).unwrap();
        assert_eq!(json["type"], "word");
        assert_eq!(json["position"], 16);
        assert_eq!(json["keyword"], "fox");
    }

    #[test]
    fn test_output_counts() {
        let mut output = SearchOutput::new();
        assert_eq!(output.total_matches(), 0);
        assert_eq!(output.files_with_matches(), 0);

        output.records.push(word("a.docx", "x", 0));
        output.records.push(word("a.docx", "x", 5));
        output.records.push(word("b.docx", "x", 1));

        assert_eq!(output.total_matches(), 3);
        assert_eq!(output.files_with_matches(), 2);
    }
}
