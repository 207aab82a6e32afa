//! LRU Segment Cache
//!
//! Keeps recently served `.m4s` payloads in memory, bounded by both an
//! entry count and a byte budget. Playlists never go through here.

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use crate::config::CacheConfig;

struct CacheInner {
    entries: LruCache<String, Bytes>,
    memory_bytes: usize,
}

/// LRU cache for recorded segments, keyed by filename
pub struct SegmentCache {
    inner: Mutex<CacheInner>,
    max_memory_bytes: usize,
}

impl SegmentCache {
    pub fn new(config: CacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_segments).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(cap),
                memory_bytes: 0,
            }),
            max_memory_bytes: config.max_memory_bytes(),
        }
    }

    /// Get a cached segment, marking it most recently used
    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.inner.lock().entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().entries.contains(name)
    }

    /// Cache a segment. Payloads larger than the whole budget are not kept.
    pub fn insert(&self, name: &str, data: Bytes) {
        let size = data.len();
        if size > self.max_memory_bytes {
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.pop(name) {
            inner.memory_bytes -= old.len();
        }

        // Evict by LRU until the new payload fits
        while inner.memory_bytes + size > self.max_memory_bytes {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => inner.memory_bytes -= evicted.len(),
                None => break,
            }
        }

        if let Some((_, evicted)) = inner.entries.push(name.to_string(), data) {
            inner.memory_bytes -= evicted.len();
        }
        inner.memory_bytes += size;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entry_count: inner.entries.len(),
            total_size_bytes: inner.memory_bytes,
            memory_limit_bytes: self.max_memory_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Current memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.inner.lock().memory_bytes
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: usize,
    pub memory_limit_bytes: usize,
}

impl Default for SegmentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
