use super::source::Basemap;
use crate::core::geo::TileCoord;
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

/// Cache key: the same coordinate differs per basemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub basemap: Basemap,
    pub coord: TileCoord,
}

impl TileKey {
    pub fn new(basemap: Basemap, coord: TileCoord) -> Self {
        Self { basemap, coord }
    }
}

/// In-memory tile cache using LRU eviction
#[derive(Debug, Clone)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileKey, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// Capacity of zero falls back to one entry
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, key: &TileKey) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: TileKey, data: Vec<u8>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, Arc::new(data));
        }
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(key))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Gets the current number of cached tiles
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(basemap: Basemap, x: u32) -> TileKey {
        TileKey::new(basemap, TileCoord::new(x, 0, 3))
    }

    #[test]
    fn test_basemaps_are_cached_separately() {
        let cache = TileCache::new(4);
        cache.insert(key(Basemap::OpenStreetMap, 1), vec![1]);

        assert!(cache.contains(&key(Basemap::OpenStreetMap, 1)));
        assert!(!cache.contains(&key(Basemap::Satellite, 1)));

        cache.insert(key(Basemap::Satellite, 1), vec![2]);
        assert_eq!(*cache.get(&key(Basemap::Satellite, 1)).unwrap(), vec![2]);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = TileCache::new(2);
        cache.insert(key(Basemap::OpenStreetMap, 1), vec![1]);
        cache.insert(key(Basemap::OpenStreetMap, 2), vec![2]);

        // Touch the first entry so the second becomes least recently used
        assert!(cache.get(&key(Basemap::OpenStreetMap, 1)).is_some());
        cache.insert(key(Basemap::OpenStreetMap, 3), vec![3]);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key(Basemap::OpenStreetMap, 1)));
        assert!(!cache.contains(&key(Basemap::OpenStreetMap, 2)));
    }
}
