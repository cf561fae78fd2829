//! Cache backends for mapping metadata and queries.
//!
//! Development mode uses an in-process [`ArrayCache`] that is discarded with
//! the configuration. Production mode uses a [`PersistentCache`] on disk that
//! survives restarts.

mod array;
mod persistent;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;

pub use array::ArrayCache;
pub use persistent::PersistentCache;

/// Cache backend shared by the metadata cache and the query cache.
pub type SharedCache = Arc<dyn CacheBackend>;

/// Kind of cache backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Process-local map.
    Array,
    /// On-disk store shared across runs.
    Persistent,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Array => f.write_str("array"),
            CacheKind::Persistent => f.write_str("persistent"),
        }
    }
}

/// Key-value cache backend.
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Kind of this backend.
    fn kind(&self) -> CacheKind;

    /// Fetch a cached value.
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one.
    fn save(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a value. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every value.
    fn flush(&self) -> Result<()>;

    /// Hit and miss counters.
    fn stats(&self) -> &CacheStats;

    /// Check if a key is cached.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.fetch(key)?.is_some())
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    pub(crate) fn record<T>(&self, value: &Option<T>) {
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
