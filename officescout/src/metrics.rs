use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::filters::FileKind;

/// Tracks cache effectiveness and decoding work across searches
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Cache metrics
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
    cache_evictions: Arc<AtomicU64>,

    // Decoder metrics
    excel_decodes: Arc<AtomicU64>,
    word_decodes: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,

    // File processing metrics
    files_processed: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
            cache_evictions: Arc::new(AtomicU64::new(0)),
            excel_decodes: Arc::new(AtomicU64::new(0)),
            word_decodes: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            files_processed: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_eviction(&self) {
        self.cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a fresh decode of `bytes` raw bytes
    pub fn record_decode(&self, kind: FileKind, bytes: u64) {
        match kind {
            FileKind::Excel => self.excel_decodes.fetch_add(1, Ordering::Relaxed),
            FileKind::Word => self.word_decodes.fetch_add(1, Ordering::Relaxed),
        };
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records the outcome of one eligible file
    pub fn record_file(&self, failed: bool) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total fresh decodes of both kinds
    pub fn decodes(&self) -> u64 {
        self.excel_decodes.load(Ordering::Relaxed) + self.word_decodes.load(Ordering::Relaxed)
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_evictions: self.cache_evictions.load(Ordering::Relaxed),
            excel_decodes: self.excel_decodes.load(Ordering::Relaxed),
            word_decodes: self.word_decodes.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub excel_decodes: u64,
    pub word_decodes: u64,
    pub bytes_read: u64,
    pub files_processed: u64,
    pub files_failed: u64,
}

impl ScanStats {
    /// Counter growth since `earlier`, a snapshot of the same metrics
    pub fn since(&self, earlier: &ScanStats) -> ScanStats {
        ScanStats {
            cache_hits: self.cache_hits.saturating_sub(earlier.cache_hits),
            cache_misses: self.cache_misses.saturating_sub(earlier.cache_misses),
            cache_evictions: self.cache_evictions.saturating_sub(earlier.cache_evictions),
            excel_decodes: self.excel_decodes.saturating_sub(earlier.excel_decodes),
            word_decodes: self.word_decodes.saturating_sub(earlier.word_decodes),
            bytes_read: self.bytes_read.saturating_sub(earlier.bytes_read),
            files_processed: self.files_processed.saturating_sub(earlier.files_processed),
            files_failed: self.files_failed.saturating_sub(earlier.files_failed),
        }
    }

    /// Logs these statistics under `label`
    pub fn log(&self, label: &str) {
        info!(
            "{}:\n\
             Cache hits/misses/evictions: {}/{}/{}\n\
             Decodes (excel/word): {}/{}\n\
             Bytes read: {}\n\
             Files processed/failed: {}/{}",
            label,
            self.cache_hits,
            self.cache_misses,
            self.cache_evictions,
            self.excel_decodes,
            self.word_decodes,
            self.bytes_read,
            self.files_processed,
            self.files_failed
        );
    }
}
