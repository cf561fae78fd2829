//! In-process array cache.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{CacheBackend, CacheKind, CacheStats};
use crate::error::Result;

/// Process-local cache. Contents are lost when the cache is dropped.
#[derive(Debug, Default)]
pub struct ArrayCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    stats: CacheStats,
}

impl ArrayCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheBackend for ArrayCache {
    fn kind(&self) -> CacheKind {
        CacheKind::Array
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.entries.read().get(key).cloned();
        self.stats.record(&value);
        Ok(value)
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn flush(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_fetch_delete() {
        let cache = ArrayCache::new();
        assert_eq!(cache.fetch("metadata").unwrap(), None);

        cache.save("metadata", b"bundle").unwrap();
        assert_eq!(cache.fetch("metadata").unwrap(), Some(b"bundle".to_vec()));
        assert!(cache.contains("metadata").unwrap());

        assert!(cache.delete("metadata").unwrap());
        assert!(!cache.delete("metadata").unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats() {
        let cache = ArrayCache::new();
        cache.save("a", b"1").unwrap();

        cache.fetch("a").unwrap();
        cache.fetch("a").unwrap();
        cache.fetch("b").unwrap();

        assert_eq!(cache.stats().hits(), 2);
        assert_eq!(cache.stats().misses(), 1);
        assert!((cache.stats().hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flush() {
        let cache = ArrayCache::new();
        cache.save("a", b"1").unwrap();
        cache.save("b", b"2").unwrap();
        cache.flush().unwrap();
        assert_eq!(cache.len(), 0);
    }
}
