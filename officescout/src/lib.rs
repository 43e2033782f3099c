//! Concurrent keyword search over Word and Excel documents.
//!
//! A [`Scout`] owns the decoded-content caches and the document decoders. Each
//! call to [`Scout::search`] walks a directory tree, extracts every eligible
//! `.xlsx`/`.xls`/`.docx`/`.doc` file (or takes it from the cache), and reports
//! each place a keyword occurs.
//!
//! ```no_run
//! use officescout::{LogReporter, Scout, ScoutConfig, SearchOptions};
//!
//! let scout = Scout::new(ScoutConfig::default());
//! let options = SearchOptions::new("/srv/reports", "budget, 2024");
//! let output = scout.search(&options, &LogReporter)?;
//! for record in &output.records {
//!     println!("{}: {}", record.file().display(), record.content());
//! }
//! # Ok::<(), officescout::SearchError>(())
//! ```
pub mod cache;
pub mod config;
pub mod errors;
pub mod events;
pub mod extract;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;

pub use cache::CacheInfo;
pub use config::{ConfigOverrides, ScoutConfig, SearchOptions};
pub use errors::{SearchError, SearchResult};
pub use events::{
    ChannelReporter, ErrorEvent, ErrorKind, LogReporter, NullReporter, ProgressEvent,
    SearchEvent, SearchReporter,
};
pub use filters::FileKind;
pub use metrics::{ScanMetrics, ScanStats};
pub use results::{MatchRecord, SearchOutput};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::extract::{
    CalamineDecoder, ContentExtractor, ExcelExtractor, OfficeTextDecoder, TextDecoder,
    WordExtractor, WorkbookDecoder,
};
use crate::search::{looks_like_markup, FileProcessor, KeywordMatcher};

/// Search engine with a process-lifetime content cache
pub struct Scout {
    config: ScoutConfig,
    cache: Arc<CacheStore>,
    excel: Arc<dyn ContentExtractor>,
    word: Arc<dyn ContentExtractor>,
    metrics: ScanMetrics,
    root: Option<PathBuf>,
}

impl Scout {
    /// Creates an engine using calamine for spreadsheets and the built-in
    /// Word readers for documents
    pub fn new(config: ScoutConfig) -> Self {
        Self::with_decoders(config, Arc::new(CalamineDecoder), Arc::new(OfficeTextDecoder))
    }

    /// Creates an engine with caller-supplied decoders
    pub fn with_decoders(
        config: ScoutConfig,
        workbooks: Arc<dyn WorkbookDecoder>,
        text: Arc<dyn TextDecoder>,
    ) -> Self {
        let metrics = ScanMetrics::new();
        let cache = Arc::new(CacheStore::new(config.cache_capacity.get(), &metrics));
        let excel = Arc::new(ExcelExtractor::new(
            Arc::clone(&cache),
            workbooks,
            metrics.clone(),
        ));
        let word = Arc::new(WordExtractor::new(Arc::clone(&cache), text, metrics.clone()));
        Self {
            config,
            cache,
            excel,
            word,
            metrics,
            root: None,
        }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// The root chosen by the last [`select_root`](Self::select_root)
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Records the directory the user picked and empties both caches.
    ///
    /// The caches are cleared even when the pick was cancelled (`None`).
    pub fn select_root(&mut self, chosen: Option<PathBuf>) -> Option<PathBuf> {
        self.cache.clear();
        self.root = chosen.clone();
        chosen
    }

    /// Searches `options.root_directory`, reporting progress and per-file
    /// failures to `reporter` as they happen.
    ///
    /// Fails only when the root is not an existing directory or the worker
    /// pool cannot be started; everything else ends up in
    /// [`SearchOutput::errors`].
    pub fn search(
        &self,
        options: &SearchOptions,
        reporter: &dyn SearchReporter,
    ) -> SearchResult<SearchOutput> {
        let matcher = KeywordMatcher::new(options.keywords.clone(), options.case_sensitive);
        if matcher.is_empty() {
            search::validate_root(&options.root_directory)?;
            debug!("No keywords provided, returning empty result");
            return Ok(SearchOutput::new());
        }

        let policy = self
            .config
            .markup_filter
            .then_some(looks_like_markup as search::MarkupPolicy);
        let processor = FileProcessor::new(Arc::clone(&self.excel), Arc::clone(&self.word), matcher)
            .with_markup_policy(policy);

        let started = Instant::now();
        let output = search::run(
            options,
            &processor,
            self.config.concurrency,
            reporter,
            &self.metrics,
        )?;
        info!(
            "Searched {} files in {:?}",
            output.files_processed,
            started.elapsed()
        );
        Ok(output)
    }

    /// Empties both caches and returns the resulting counts
    pub fn clear_cache(&self) -> CacheInfo {
        self.cache.clear();
        self.cache.info()
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_select_root_clears_caches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        std::fs::write(&path, "x").unwrap();

        let mut scout = Scout::new(ScoutConfig::default());
        scout
            .cache
            .excel
            .set(path.clone(), Arc::new(crate::extract::Workbook::default()));
        assert_eq!(scout.cache_info().excel_entry_count, 1);

        assert_eq!(
            scout.select_root(Some(dir.path().to_path_buf())),
            Some(dir.path().to_path_buf())
        );
        assert_eq!(scout.cache_info(), CacheInfo::default());
        assert_eq!(scout.root(), Some(dir.path()));

        assert_eq!(scout.select_root(None), None);
        assert_eq!(scout.root(), None);
    }

    #[test]
    fn test_empty_keywords_still_validate_root() {
        let scout = Scout::new(ScoutConfig::default());
        let dir = tempdir().unwrap();

        let output = scout
            .search(&SearchOptions::new(dir.path(), " , "), &NullReporter)
            .unwrap();
        assert!(output.records.is_empty());

        let err = scout
            .search(&SearchOptions::new(dir.path().join("nope"), ""), &NullReporter)
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidRoot(_)));
    }
}
