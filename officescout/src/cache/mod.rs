//! In-memory caches of decoded document content.
//!
//! Decoding an office document dominates the cost of a scan, so decoded
//! workbooks and extracted Word text are kept per absolute file path. Each
//! cache is bounded and evicts the least recently accessed entry. Nothing is
//! written to disk; the caches live as long as the owning
//! [`Scout`](crate::Scout) or until they are cleared.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::extract::Workbook;
use crate::metrics::ScanMetrics;

/// A cached value plus its logical access stamp
#[derive(Debug)]
pub struct CacheEntry<V: ?Sized> {
    pub value: Arc<V>,
    /// Value of the cache clock at the last insert or hit
    pub last_accessed: u64,
}

/// Bounded map from file path to value with least-recently-used eviction.
///
/// Recency is tracked with a per-cache logical clock that advances on every
/// insert and hit, so no two entries share a stamp. Entries are replaced
/// wholesale; a value is never mutated in place.
#[derive(Debug)]
pub struct LruCache<V: ?Sized> {
    entries: HashMap<PathBuf, CacheEntry<V>>,
    capacity: usize,
    clock: u64,
}

impl<V: ?Sized> LruCache<V> {
    /// Creates an empty cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Returns the cached value and marks it most recently used
    pub fn get(&mut self, key: &Path) -> Option<Arc<V>> {
        let now = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_accessed = now;
        Some(Arc::clone(&entry.value))
    }

    /// Inserts or replaces `key`, returning the key evicted to make room.
    ///
    /// Replacing an existing key never evicts.
    pub fn set(&mut self, key: PathBuf, value: Arc<V>) -> Option<PathBuf> {
        let evicted = if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let now = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_accessed: now,
            },
        );
        evicted
    }

    fn evict_lru(&mut self) -> Option<PathBuf> {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&lru_key);
        Some(lru_key)
    }

    /// Drops every entry and returns how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Access stamp of `key` without touching recency
    pub fn last_accessed(&self, key: &Path) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.last_accessed)
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Thread-safe [`LruCache`] shared by the workers of a search
#[derive(Debug)]
pub struct ContentCache<V: ?Sized> {
    name: &'static str,
    inner: Mutex<LruCache<V>>,
    metrics: ScanMetrics,
}

impl<V: ?Sized> ContentCache<V> {
    pub fn new(name: &'static str, capacity: usize, metrics: ScanMetrics) -> Self {
        Self {
            name,
            inner: Mutex::new(LruCache::new(capacity)),
            metrics,
        }
    }

    pub fn get(&self, key: &Path) -> Option<Arc<V>> {
        let value = self.inner.lock().get(key);
        self.metrics.record_cache_lookup(value.is_some());
        value
    }

    pub fn set(&self, key: PathBuf, value: Arc<V>) {
        if let Some(evicted) = self.inner.lock().set(key, value) {
            self.metrics.record_eviction();
            debug!("{} cache evicted {}", self.name, evicted.display());
        }
    }

    /// Drops every entry and returns the pre-clear count
    pub fn clear(&self) -> usize {
        self.inner.lock().clear()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Entry counts of the two content caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub word_entry_count: usize,
    pub excel_entry_count: usize,
}

/// The workbook cache and the document-text cache
#[derive(Debug)]
pub struct CacheStore {
    pub excel: ContentCache<Workbook>,
    pub word: ContentCache<str>,
}

impl CacheStore {
    pub fn new(capacity: usize, metrics: &ScanMetrics) -> Self {
        Self {
            excel: ContentCache::new("excel", capacity, metrics.clone()),
            word: ContentCache::new("word", capacity, metrics.clone()),
        }
    }

    pub fn info(&self) -> CacheInfo {
        CacheInfo {
            word_entry_count: self.word.len(),
            excel_entry_count: self.excel.len(),
        }
    }

    /// Clears both caches, returning the counts they held before
    pub fn clear(&self) -> CacheInfo {
        let cleared = CacheInfo {
            word_entry_count: self.word.clear(),
            excel_entry_count: self.excel.clear(),
        };
        debug!(
            "Cleared caches: {} word, {} excel entries",
            cleared.word_entry_count, cleared.excel_entry_count
        );
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> PathBuf {
        PathBuf::from(format!("/docs/file_{}.docx", i))
    }

    #[test]
    fn test_get_bumps_recency() {
        let mut cache: LruCache<str> = LruCache::new(2);
        cache.set(key(1), Arc::from("one"));
        cache.set(key(2), Arc::from("two"));

        // Touch 1 so that 2 becomes the eviction candidate
        assert_eq!(cache.get(&key(1)).as_deref(), Some("one"));
        let evicted = cache.set(key(3), Arc::from("three"));

        assert_eq!(evicted, Some(key(2)));
        assert!(cache.contains(&key(1)));
        assert!(cache.contains(&key(3)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evicts_smallest_access_stamp() {
        for capacity in [1usize, 2, 5, 17] {
            let mut cache: LruCache<usize> = LruCache::new(capacity);
            for i in 0..capacity {
                cache.set(key(i), Arc::new(i));
            }

            let oldest = (0..capacity)
                .min_by_key(|i| cache.last_accessed(&key(*i)).unwrap())
                .unwrap();
            let evicted = cache.set(key(capacity), Arc::new(capacity));

            assert_eq!(evicted, Some(key(oldest)));
            assert_eq!(cache.len(), capacity);
        }
    }

    #[test]
    fn test_access_stamps_strictly_increase() {
        let mut cache: LruCache<usize> = LruCache::new(10);
        cache.set(key(1), Arc::new(1));
        let first = cache.last_accessed(&key(1)).unwrap();
        cache.get(&key(1));
        let second = cache.last_accessed(&key(1)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_replace_existing_does_not_evict() {
        let mut cache: LruCache<str> = LruCache::new(2);
        cache.set(key(1), Arc::from("a"));
        cache.set(key(2), Arc::from("b"));

        assert_eq!(cache.set(key(1), Arc::from("a2")), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)).as_deref(), Some("a2"));
    }

    #[test]
    fn test_miss_returns_none() {
        let mut cache: LruCache<str> = LruCache::new(3);
        assert!(cache.get(&key(9)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_returns_previous_count() {
        let mut cache: LruCache<str> = LruCache::new(3);
        cache.set(key(1), Arc::from("a"));
        cache.set(key(2), Arc::from("b"));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache: LruCache<str> = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.set(key(1), Arc::from("a"));
        assert_eq!(cache.set(key(2), Arc::from("b")), Some(key(1)));
    }

    #[test]
    fn test_content_cache_records_metrics() {
        let metrics = ScanMetrics::new();
        let cache: ContentCache<str> = ContentCache::new("word", 1, metrics.clone());

        assert!(cache.get(&key(1)).is_none());
        cache.set(key(1), Arc::from("text"));
        assert!(cache.get(&key(1)).is_some());
        cache.set(key(2), Arc::from("other"));

        let stats = metrics.get_stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_evictions, 1);
    }

    #[test]
    fn test_store_clear_and_info() {
        let metrics = ScanMetrics::new();
        let store = CacheStore::new(10, &metrics);
        store.word.set(key(1), Arc::from("text"));
        store.word.set(key(2), Arc::from("more"));
        store.excel.set(key(3), Arc::new(Workbook::default()));

        assert_eq!(
            store.info(),
            CacheInfo {
                word_entry_count: 2,
                excel_entry_count: 1
            }
        );
        assert_eq!(
            store.clear(),
            CacheInfo {
                word_entry_count: 2,
                excel_entry_count: 1
            }
        );
        assert_eq!(store.info(), CacheInfo::default());
    }
}
