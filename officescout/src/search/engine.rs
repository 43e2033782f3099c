use ignore::WalkBuilder;
use parking_lot::Mutex;
use rayon::{Scope, ThreadPoolBuilder};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use super::processor::FileProcessor;
use crate::config::SearchOptions;
use crate::errors::{unify_path, SearchError, SearchResult};
use crate::events::{ErrorEvent, ErrorKind, ProgressEvent, SearchReporter};
use crate::filters::{classify_eligible, is_skipped_name, Classified};
use crate::metrics::ScanMetrics;
use crate::results::{MatchRecord, SearchOutput};

/// Fails unless `root` is an existing directory; returns its absolute form
pub fn validate_root(root: &Path) -> SearchResult<PathBuf> {
    if !root.is_dir() {
        return Err(SearchError::invalid_root(root));
    }
    Ok(unify_path(root))
}

/// Runs both passes over `options.root_directory`.
///
/// The count pass walks the tree once to size the progress total. The process
/// pass then lists every directory on a pool of `concurrency` threads, spawning
/// one task per subdirectory and per eligible file; the pool scope returns once
/// every task has finished.
pub fn run(
    options: &SearchOptions,
    processor: &FileProcessor,
    concurrency: NonZeroUsize,
    reporter: &dyn SearchReporter,
    metrics: &ScanMetrics,
) -> SearchResult<SearchOutput> {
    let root = validate_root(&options.root_directory)?;
    let started = Instant::now();
    let baseline = metrics.get_stats();
    info!(
        "Starting search in {} for {:?}",
        root.display(),
        options.keywords
    );

    let collector = Collector::new(reporter);
    let total = count_eligible(&root, options, &collector);
    debug!("Found {} eligible files", total);

    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency.get())
        .thread_name(|i| format!("officescout-worker-{}", i))
        .build()
        .map_err(|e| SearchError::ThreadPool(e.to_string()))?;

    let run = SearchRun {
        options,
        processor,
        metrics,
        collector,
        progress: ProgressTracker::new(total),
    };
    pool.scope(|scope| walk_dir(scope, root, &run));

    let (files_processed, files_failed) = run.progress.counts();
    let (records, errors) = run.collector.into_parts();
    metrics.get_stats().since(&baseline).log("Search stats");

    let output = SearchOutput {
        records,
        errors,
        files_total: total,
        files_processed,
        files_failed,
        elapsed: started.elapsed(),
    };
    info!(
        "Search complete. Found {} matches in {} files ({} errors)",
        output.total_matches(),
        output.files_with_matches(),
        output.errors.len()
    );
    Ok(output)
}

/// Counts eligible files below `root` without following symlinks
fn count_eligible(root: &Path, options: &SearchOptions, collector: &Collector<'_>) -> usize {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_name(entry.file_name()))
        .build();

    let mut total = 0;
    for entry in walker {
        match entry {
            Ok(entry) => {
                let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                if is_file && classify_eligible(entry.path(), |kind| options.includes(kind)).is_some()
                {
                    total += 1;
                }
            }
            Err(err) => {
                let path = walk_error_path(&err).unwrap_or(root).to_path_buf();
                collector.report(ErrorEvent::new(path, ErrorKind::DirectoryRead, err.to_string()));
            }
        }
    }
    total
}

fn walk_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}

/// State shared by every task of one process pass
struct SearchRun<'a> {
    options: &'a SearchOptions,
    processor: &'a FileProcessor,
    metrics: &'a ScanMetrics,
    collector: Collector<'a>,
    progress: ProgressTracker,
}

impl SearchRun<'_> {
    fn process_file(&self, path: &Path, file: Classified) {
        trace!("Processing {}", path.display());
        let failed = match self.processor.process(path, file, self.options.cache_enabled) {
            Ok(records) => {
                self.collector.extend(records);
                false
            }
            Err(err) => {
                self.collector.report(ErrorEvent::from(err));
                true
            }
        };
        self.metrics.record_file(failed);
        self.progress.file_done(failed, self.collector.reporter);
    }
}

fn walk_dir<'s>(scope: &Scope<'s>, dir: PathBuf, run: &'s SearchRun<'s>) {
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            run.collector
                .report(ErrorEvent::from(SearchError::directory_read(&dir, e)));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                run.collector
                    .report(ErrorEvent::from(SearchError::directory_read(&dir, e)));
                continue;
            }
        };
        if is_skipped_name(&entry.file_name()) {
            continue;
        }

        let path = entry.path();
        // DirEntry::file_type does not follow symlinks
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                run.collector
                    .report(ErrorEvent::from(SearchError::file_read(&path, e)));
                continue;
            }
        };

        if file_type.is_dir() {
            scope.spawn(move |scope| walk_dir(scope, path, run));
        } else if file_type.is_file() {
            if let Some(file) = classify_eligible(&path, |kind| run.options.includes(kind)) {
                scope.spawn(move |_| run.process_file(&path, file));
            }
        }
    }
}

/// Append-only record and error lists filled by the workers
struct Collector<'r> {
    records: Mutex<Vec<MatchRecord>>,
    errors: Mutex<Vec<ErrorEvent>>,
    reporter: &'r dyn SearchReporter,
}

impl<'r> Collector<'r> {
    fn new(reporter: &'r dyn SearchReporter) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            reporter,
        }
    }

    fn extend(&self, records: Vec<MatchRecord>) {
        if !records.is_empty() {
            self.records.lock().extend(records);
        }
    }

    fn report(&self, event: ErrorEvent) {
        self.reporter.error(&event);
        self.errors.lock().push(event);
    }

    fn into_parts(self) -> (Vec<MatchRecord>, Vec<ErrorEvent>) {
        (self.records.into_inner(), self.errors.into_inner())
    }
}

#[derive(Debug, Default)]
struct Counts {
    processed: usize,
    failed: usize,
}

/// Processed-file counter; events are emitted while the lock is held
struct ProgressTracker {
    total: usize,
    counts: Mutex<Counts>,
}

impl ProgressTracker {
    fn new(total: usize) -> Self {
        Self {
            total,
            counts: Mutex::new(Counts::default()),
        }
    }

    fn file_done(&self, failed: bool, reporter: &dyn SearchReporter) {
        let mut counts = self.counts.lock();
        counts.processed += 1;
        if failed {
            counts.failed += 1;
        }
        reporter.progress(ProgressEvent::new(counts.processed, self.total));
    }

    fn counts(&self) -> (usize, usize) {
        let counts = self.counts.lock();
        (counts.processed, counts.failed)
    }
}
