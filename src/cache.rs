//! Query result cache
//!
//! Memoizes final result sets by (operator, query text, phrase flag) in an
//! LRU. Values are Arc-wrapped so a cache hit clones a pointer, not the
//! match list. Only final results enter the cache; transient per-word
//! result sets produced during execution are never stored.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::postings::ResultSet;

pub struct QueryCache {
    cache: Mutex<LruCache<Vec<u8>, Arc<ResultSet>>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1000).unwrap());
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Look up an earlier result. The phrase flag is part of the key so a
    /// quoted phrase and a bag-of-words query over the same text stay
    /// separate entries.
    pub fn get(&self, operator: &str, query: &str, phrase: bool) -> Option<Arc<ResultSet>> {
        let key = Self::key(operator, query, phrase)?;
        let mut cache = self.cache.lock();
        if let Some(results) = cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Some(Arc::clone(results));
        }
        None
    }

    pub fn put(&self, operator: &str, query: &str, phrase: bool, results: &ResultSet) {
        if let Some(key) = Self::key(operator, query, phrase) {
            let mut cache = self.cache.lock();
            cache.put(key, Arc::new(results.clone()));
        }
    }

    pub fn record_miss(&self) {
        self.miss_count.fetch_add(1, Ordering::Relaxed);
    }

    fn key(operator: &str, query: &str, phrase: bool) -> Option<Vec<u8>> {
        bincode::serialize(&(operator, query, phrase)).ok()
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hit_count.load(Ordering::Relaxed) as f64;
        let misses = self.miss_count.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            capacity: cache.cap().get(),
            size: cache.len(),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub capacity: usize,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cache: {}/{} entries, {:.1}% hit rate ({} hits, {} misses)",
            self.size,
            self.capacity,
            self.hit_rate * 100.0,
            self.hits,
            self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::IndexMatch;

    fn results_for(paths: &[&str]) -> ResultSet {
        ResultSet {
            matches: paths
                .iter()
                .map(|path| IndexMatch {
                    path: path.to_string(),
                    occurs: String::new(),
                })
                .collect(),
            ..ResultSet::default()
        }
    }

    #[test]
    fn test_cache_basic() {
        let cache = QueryCache::new(100);
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.hit_rate(), 0.0);

        cache.put("fulltext:contains", "brown", false, &results_for(&["r1", "r2"]));
        cache.put("fulltext:contains", "fox", false, &results_for(&["r1"]));

        let hit = cache.get("fulltext:contains", "brown", false).unwrap();
        assert_eq!(hit.len(), 2);
        assert!(cache.get("fulltext:contains", "missing", false).is_none());
        cache.record_miss();

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_phrase_flag_separates_entries() {
        let cache = QueryCache::new(100);
        cache.put("fulltext:contains", "brown fox", false, &results_for(&["r1", "r2"]));
        cache.put("fulltext:contains", "brown fox", true, &results_for(&["r1"]));

        assert_eq!(cache.get("fulltext:contains", "brown fox", false).unwrap().len(), 2);
        assert_eq!(cache.get("fulltext:contains", "brown fox", true).unwrap().len(), 1);
    }

    #[test]
    fn test_operator_separates_entries() {
        let cache = QueryCache::new(100);
        cache.put("fulltext:contains", "brown", false, &results_for(&["r1"]));
        assert!(cache.get("fulltext:!contains", "brown", false).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = QueryCache::new(2);
        cache.put("fulltext:contains", "a", false, &results_for(&["r1"]));
        cache.put("fulltext:contains", "b", false, &results_for(&["r2"]));

        // Touch "a" so "b" is the eviction candidate.
        cache.get("fulltext:contains", "a", false);
        cache.put("fulltext:contains", "c", false, &results_for(&["r3"]));

        assert!(cache.get("fulltext:contains", "a", false).is_some());
        assert!(cache.get("fulltext:contains", "c", false).is_some());
        assert!(cache.get("fulltext:contains", "b", false).is_none());
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache = QueryCache::new(100);
        cache.put("fulltext:contains", "a", false, &results_for(&["r1"]));
        cache.get("fulltext:contains", "a", false);
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }
}
