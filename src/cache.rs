//! Memoized glyph positions.
//!
//! Rasterizing text is the expensive part of the engine, so results are kept
//! per `(content, particle_count)`. The cache is an ordinary value owned by
//! whoever drives the engine; its growth policy is chosen at construction.
//!
//! Entries are immutable `Arc<[Vec3]>`: a repeated lookup hands back the very
//! same allocation, and an entry's length never changes after insertion.

use glam::Vec3;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cache key: the rendered content plus the requested particle count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    /// Character or string that was rasterized.
    pub content: String,
    /// Number of points in the cached array.
    pub particle_count: u32,
}

impl GlyphKey {
    /// Key for `content` at `particle_count` points.
    pub fn new(content: impl Into<String>, particle_count: u32) -> Self {
        Self {
            content: content.into(),
            particle_count,
        }
    }
}

/// How many entries the cache may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never evict. Fine for a fixed alphabet (digits, a few greetings).
    Unbounded,
    /// Evict the least recently used entry beyond `capacity`.
    Lru {
        /// Maximum number of entries.
        capacity: NonZeroUsize,
    },
}

impl CachePolicy {
    /// LRU policy; a capacity of 0 means unbounded.
    pub fn lru(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => CachePolicy::Lru { capacity },
            None => CachePolicy::Unbounded,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::lru(256)
    }
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the compute closure.
    pub misses: u64,
    /// Entries dropped by the LRU policy.
    pub evictions: u64,
}

/// Caller-owned memo of rasterized glyph positions.
pub struct PositionCache {
    entries: LruCache<GlyphKey, Arc<[Vec3]>>,
    policy: CachePolicy,
    stats: CacheStats,
}

impl PositionCache {
    /// Empty cache with the given policy.
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match policy {
            CachePolicy::Unbounded => LruCache::unbounded(),
            CachePolicy::Lru { capacity } => LruCache::new(capacity),
        };
        Self {
            entries,
            policy,
            stats: CacheStats::default(),
        }
    }

    /// The policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Return the cached array for `key`, computing and inserting it on a miss.
    ///
    /// A result whose length differs from `key.particle_count` is padded with
    /// zeros or truncated before insertion.
    pub fn get_or_compute<F>(&mut self, key: GlyphKey, compute: F) -> Arc<[Vec3]>
    where
        F: FnOnce() -> Vec<Vec3>,
    {
        if let Some(hit) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Arc::clone(hit);
        }

        self.stats.misses += 1;
        let mut points = compute();
        let expected = key.particle_count as usize;
        if points.len() != expected {
            log::warn!(
                "glyph {:?} computed {} points, expected {}",
                key.content,
                points.len(),
                expected
            );
            points.resize(expected, Vec3::ZERO);
        }

        let value: Arc<[Vec3]> = points.into();
        log::debug!("cached glyph {:?} x{}", key.content, key.particle_count);
        if let Some((evicted, _)) = self.entries.push(key, Arc::clone(&value)) {
            self.stats.evictions += 1;
            log::debug!("evicted glyph {:?} x{}", evicted.content, evicted.particle_count);
        }
        value
    }

    /// Cached array for `key`, if present. Counts as a use for LRU purposes.
    pub fn get(&mut self, key: &GlyphKey) -> Option<Arc<[Vec3]>> {
        self.entries.get(key).cloned()
    }

    /// Whether `key` is cached, without touching recency.
    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.entries.contains(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lookup counters since construction.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

/// A [`PositionCache`] behind a mutex, for hosts that rasterize from several
/// threads. Clones share the same cache.
#[derive(Clone, Default)]
pub struct SharedPositionCache {
    inner: Arc<Mutex<PositionCache>>,
}

impl SharedPositionCache {
    /// Shared cache with the given policy.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PositionCache::new(policy))),
        }
    }

    /// See [`PositionCache::get_or_compute`]. The lock is held across `compute`.
    pub fn get_or_compute<F>(&self, key: GlyphKey, compute: F) -> Arc<[Vec3]>
    where
        F: FnOnce() -> Vec<Vec3>,
    {
        self.inner.lock().get_or_compute(key, compute)
    }

    /// Lookup counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
