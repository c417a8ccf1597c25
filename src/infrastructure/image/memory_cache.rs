//! In-memory, byte-accounted LRU cache of decoded images.

use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::{ContentKey, DecodedImage};

/// Fraction of the memory budget handed to the cache (1/8).
pub const CACHE_BUDGET_DIVISOR: usize = 8;

/// Memory budget assumed when none is configured (512 MiB).
pub const DEFAULT_MEMORY_BUDGET: usize = 512 * 1024 * 1024;

/// Returns the cache capacity for a given memory budget.
#[must_use]
pub const fn capacity_for_budget(memory_budget: usize) -> usize {
    memory_budget / CACHE_BUDGET_DIVISOR
}

struct CacheState {
    entries: LruCache<ContentKey, DecodedImage>,
    bytes: usize,
}

/// Byte-size-aware LRU store of decoded images keyed by content key.
///
/// The total size of resident entries never exceeds the capacity. Both hits
/// and insertions count as accesses; the least recently accessed entries are
/// evicted first. Thread-safe; every operation takes one short lock.
pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    /// Creates a cache holding at most `capacity_bytes` of pixels.
    #[must_use]
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                bytes: 0,
            }),
            capacity: capacity_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates a cache sized for the default memory budget.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(capacity_for_budget(DEFAULT_MEMORY_BUDGET))
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&self, key: &ContentKey) -> Option<DecodedImage> {
        let mut state = self.state.lock();
        if let Some(image) = state.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Result cache hit");
            Some(image.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Result cache miss");
            None
        }
    }

    /// Looks up `key` without touching recency or counters.
    pub fn peek(&self, key: &ContentKey) -> Option<DecodedImage> {
        self.state.lock().entries.peek(key).cloned()
    }

    /// Returns true if `key` is resident.
    pub fn contains(&self, key: &ContentKey) -> bool {
        self.state.lock().entries.contains(key)
    }

    /// Inserts `image` under `key`, evicting least recently used entries
    /// until it fits.
    ///
    /// The first writer wins: if `key` is already resident this is a no-op.
    /// An image larger than the whole capacity is never cached. Returns true
    /// if the image was inserted.
    pub fn put(&self, key: ContentKey, image: DecodedImage) -> bool {
        let size = image.byte_size();
        if size > self.capacity {
            debug!(
                key = %key,
                size = size,
                capacity = self.capacity,
                "Image larger than cache capacity, not caching"
            );
            return false;
        }

        let mut state = self.state.lock();
        if state.entries.contains(&key) {
            trace!(key = %key, "Already cached, keeping first result");
            return false;
        }

        while state.bytes + size > self.capacity {
            let Some((evicted_key, evicted)) = state.entries.pop_lru() else {
                break;
            };
            state.bytes = state.bytes.saturating_sub(evicted.byte_size());
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %evicted_key, size = evicted.byte_size(), "Evicted image from result cache");
        }

        state.bytes += size;
        state.entries.put(key, image);
        true
    }

    /// Removes `key`, returning its image if it was resident.
    pub fn remove(&self, key: &ContentKey) -> Option<DecodedImage> {
        let mut state = self.state.lock();
        let image = state.entries.pop(key)?;
        state.bytes = state.bytes.saturating_sub(image.byte_size());
        Some(image)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.bytes = 0;
        debug!("Cleared result cache");
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held by resident entries.
    pub fn size_bytes(&self) -> usize {
        self.state.lock().bytes
    }

    /// Configured capacity in bytes.
    #[must_use]
    pub const fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    /// Resident keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<ContentKey> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let (entries, bytes) = {
            let state = self.state.lock();
            (state.entries.len(), state.bytes)
        };
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate,
            entries,
            bytes,
            capacity: self.capacity,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries evicted to make room.
    pub evictions: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub entries: usize,
    /// Bytes held by cached images.
    pub bytes: usize,
    /// Capacity in bytes.
    pub capacity: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {}/{} bytes, {:.1}% hit rate ({} hits, {} misses, {} evictions)",
            self.entries,
            self.bytes,
            self.capacity,
            self.hit_rate,
            self.hits,
            self.misses,
            self.evictions
        )
    }
}
