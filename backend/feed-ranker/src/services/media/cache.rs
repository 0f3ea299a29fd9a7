use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Size assumed for a media entry when the caller does not know better.
pub const DEFAULT_ENTRY_BYTES: u64 = 1_000_000;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte-bounded media cache ordered by **write** recency.
///
/// `put` moves a key to the most-recent position; `has` does not. Reads
/// never extend an entry's lifetime, so eviction order is exactly the
/// order of the last `put` per key.
pub struct MediaCache {
    entries: LruCache<String, u64>,
    max_bytes: u64,
    total_bytes: u64,
}

impl MediaCache {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            entries: LruCache::unbounded(),
            max_bytes,
            total_bytes: 0,
        }
    }

    /// Insert or refresh `key`, evicting oldest writes first so the total
    /// stays within `max_bytes`. An entry larger than the whole cache
    /// evicts everything, itself included.
    pub fn put(&mut self, key: &str, approx_size_bytes: u64) {
        if let Some(previous) = self.entries.pop(key) {
            self.total_bytes -= previous;
        }

        if approx_size_bytes > self.max_bytes {
            debug!(
                key = %key,
                size = approx_size_bytes,
                max_bytes = self.max_bytes,
                "Media entry exceeds cache size, clearing"
            );
            self.entries.clear();
            self.total_bytes = 0;
            return;
        }

        // total <= max and size <= max, so the subtraction cannot underflow
        while self.total_bytes > self.max_bytes - approx_size_bytes {
            match self.entries.pop_lru() {
                Some((evicted, size)) => {
                    self.total_bytes -= size;
                    debug!(key = %evicted, size = size, "Evicted media entry");
                }
                None => break,
            }
        }

        self.entries.put(key.to_string(), approx_size_bytes);
        self.total_bytes += approx_size_bytes;
    }

    pub fn put_default(&mut self, key: &str) {
        self.put(key, DEFAULT_ENTRY_BYTES);
    }

    /// Membership only. Does not promote.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn usage_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Resident size rounded to whole megabytes (MiB). Diagnostics only.
    pub fn usage_mb(&self) -> u64 {
        (self.total_bytes as f64 / BYTES_PER_MB).round() as u64
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys from oldest to newest write, i.e. eviction order.
    pub fn keys_by_age(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }
}

/// Snapshot for diagnostics surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub usage_bytes: u64,
    pub usage_mb: u64,
    pub max_bytes: u64,
}

/// Shared handle to a [`MediaCache`].
///
/// Passed explicitly to the prefetch coordinator and to whatever needs
/// cache statistics. The lock is never held across an await point.
#[derive(Clone)]
pub struct SharedMediaCache {
    inner: Arc<Mutex<MediaCache>>,
}

impl SharedMediaCache {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MediaCache::new(max_bytes))),
        }
    }

    pub fn put(&self, key: &str, approx_size_bytes: u64) {
        self.inner.lock().put(key, approx_size_bytes);
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().has(key)
    }

    pub fn usage_mb(&self) -> u64 {
        self.inner.lock().usage_mb()
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.inner.lock();
        CacheStats {
            entries: cache.len(),
            usage_bytes: cache.usage_bytes(),
            usage_mb: cache.usage_mb(),
            max_bytes: cache.max_bytes(),
        }
    }

    pub fn keys_by_age(&self) -> Vec<String> {
        self.inner.lock().keys_by_age()
    }
}
