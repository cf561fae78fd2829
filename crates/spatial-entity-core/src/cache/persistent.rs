//! Persistent on-disk cache.

use std::path::{Path, PathBuf};

use sled::{Db, Tree};

use super::{CacheBackend, CacheKind, CacheStats};
use crate::error::Result;

/// Tree name for cache entries.
const CACHE_TREE: &str = "spatial_entity:cache";

/// Page cache capacity of the backing store (16 MB).
const PAGE_CACHE_CAPACITY: u64 = 16 * 1024 * 1024;

/// Cache stored in a sled database.
#[derive(Debug)]
pub struct PersistentCache {
    _db: Db,
    tree: Tree,
    path: Option<PathBuf>,
    stats: CacheStats,
}

impl PersistentCache {
    /// Open or create a cache in the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(PAGE_CACHE_CAPACITY)
            .open()?;
        tracing::debug!(path = %path.display(), "opened persistent cache");
        Self::from_db(db, Some(path.to_path_buf()))
    }

    /// Create a cache in a temporary location, removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .cache_capacity(PAGE_CACHE_CAPACITY)
            .open()?;
        Self::from_db(db, None)
    }

    fn from_db(db: Db, path: Option<PathBuf>) -> Result<Self> {
        let tree = db.open_tree(CACHE_TREE)?;
        Ok(Self {
            _db: db,
            tree,
            path,
            stats: CacheStats::default(),
        })
    }

    /// Directory of the cache, `None` for a temporary cache.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl CacheBackend for PersistentCache {
    fn kind(&self) -> CacheKind {
        CacheKind::Persistent
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.tree.get(key)?.map(|v| v.to_vec());
        self.stats.record(&value);
        Ok(value)
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        self.tree.insert(key, value)?;
        self.tree.flush()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.tree.remove(key)?.is_some())
    }

    fn flush(&self) -> Result<()> {
        self.tree.clear()?;
        self.tree.flush()?;
        Ok(())
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.tree.contains_key(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_cache() {
        let cache = PersistentCache::temporary().unwrap();
        assert!(cache.path().is_none());
        assert_eq!(cache.kind(), CacheKind::Persistent);

        cache.save("metadata", b"bundle").unwrap();
        assert_eq!(cache.fetch("metadata").unwrap(), Some(b"bundle".to_vec()));
        assert_eq!(cache.len(), 1);

        cache.flush().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");

        {
            let cache = PersistentCache::open(&path).unwrap();
            cache.save("metadata", b"bundle").unwrap();
        }

        let cache = PersistentCache::open(&path).unwrap();
        assert_eq!(cache.path(), Some(path.as_path()));
        assert_eq!(cache.fetch("metadata").unwrap(), Some(b"bundle".to_vec()));
    }
}
