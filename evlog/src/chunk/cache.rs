use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use lru::LruCache;
use serde::Serialize;

use super::Chunk;

/// Размер кеша по умолчанию
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Ключ кеша: `(start, end)` после ограничения по кол-ву записей
pub type ChunkKey = (u64, u64);

/// Кеш диапазонов
///
/// Блокировка удерживается только на время поиска/вставки
#[derive(Debug)]
pub struct ChunkCache {
    lru: Mutex<LruCache<ChunkKey, Arc<Chunk>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Счетчики кеша
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

impl ChunkCache {
    /// Кеш на `capacity` диапазонов, 0 считается как 1
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lru: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        let found = match self.lru.lock() {
            Ok(mut lru) => lru.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        };
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn put(&self, key: ChunkKey, chunk: Arc<Chunk>) {
        match self.lru.lock() {
            Ok(mut lru) => lru.put(key, chunk),
            Err(poisoned) => poisoned.into_inner().put(key, chunk),
        };
    }

    pub fn stats(&self) -> CacheStats {
        let len = match self.lru.lock() {
            Ok(lru) => lru.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len,
            capacity: self.capacity,
        }
    }
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[test]
fn cache_evicts_least_recent() {
    let cache = ChunkCache::new(2);
    cache.put((0, 1), Arc::new(Chunk::empty(0, 10)));
    cache.put((1, 2), Arc::new(Chunk::empty(1, 10)));
    assert!(cache.get(&(0, 1)).is_some());
    cache.put((2, 3), Arc::new(Chunk::empty(2, 10)));

    assert!(cache.get(&(1, 2)).is_none());
    assert!(cache.get(&(2, 3)).is_some());

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.len, 2);
    assert_eq!(stats.capacity, 2);
}

#[test]
fn zero_capacity_holds_one() {
    let cache = ChunkCache::new(0);
    cache.put((0, 1), Arc::new(Chunk::empty(0, 1)));
    assert!(cache.get(&(0, 1)).is_some());
    assert_eq!(cache.stats().capacity, 1);
}
