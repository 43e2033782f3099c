/// File classification for the scan.
///
/// Classification is purely name based: the extension decides the document
/// kind, and two name prefixes exclude an entry before anything else is looked
/// at. Office suites leave `~$name.docx` owner files next to open documents;
/// these are never real documents and are skipped silently, as are dot-files
/// and dot-directories.
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::SearchError;

/// Prefix of office-suite lock files
pub const LOCK_FILE_PREFIX: &str = "~$";
/// Prefix of hidden files and directories
pub const HIDDEN_PREFIX: &str = ".";

/// Document families the engine can search
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Excel,
    Word,
}

impl FileKind {
    pub const ALL: [FileKind; 2] = [FileKind::Excel, FileKind::Word];

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Excel => "excel",
            FileKind::Word => "word",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" => Ok(FileKind::Excel),
            "word" => Ok(FileKind::Word),
            other => Err(SearchError::config_error(format!(
                "Unknown file type '{}' (expected excel or word)",
                other
            ))),
        }
    }
}

/// Container format of a Word document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordFormat {
    /// Office Open XML (`.docx`)
    Docx,
    /// Word 97-2003 binary (`.doc`)
    Doc,
}

/// What a file turned out to be after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Excel,
    Word(WordFormat),
}

impl Classified {
    pub fn kind(self) -> FileKind {
        match self {
            Classified::Excel => FileKind::Excel,
            Classified::Word(_) => FileKind::Word,
        }
    }
}

/// Returns true for entry names the scan never looks at
pub fn is_skipped_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with(LOCK_FILE_PREFIX) || name.starts_with(HIDDEN_PREFIX)
}

/// Classifies a file by its lower-cased extension, ignoring any filter
pub fn classify(path: &Path) -> Option<Classified> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xls" => Some(Classified::Excel),
        "docx" => Some(Classified::Word(WordFormat::Docx)),
        "doc" => Some(Classified::Word(WordFormat::Doc)),
        _ => None,
    }
}

/// Classifies a file and applies the skip rule plus the active type filter
pub fn classify_eligible(path: &Path, enabled: impl Fn(FileKind) -> bool) -> Option<Classified> {
    if path.file_name().is_some_and(is_skipped_name) {
        return None;
    }
    classify(path).filter(|c| enabled(c.kind()))
}
