use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::observability::metrics;

/// A byte-budgeted LRU cache of whole responses keyed by request URL.
#[derive(Debug)]
pub struct ObjectCache {
    inner: Mutex<CacheInner>,
    max_cache_size: usize,
    max_object_size: usize,
}

#[derive(Debug)]
struct CacheInner {
    lru: LruCache<String, Bytes>,
    total_size: usize,
}

impl CacheInner {
    fn pop_lru(&mut self) -> bool {
        match self.lru.pop_lru() {
            Some((key, payload)) => {
                self.total_size -= payload.len();
                tracing::debug!(key = %key, size = payload.len(), "Evicted cache entry");
                metrics::record_cache_eviction();
                true
            }
            None => false,
        }
    }

    fn publish_size(&self) {
        metrics::record_cache_size(self.total_size, self.lru.len());
    }
}

impl ObjectCache {
    /// Create an empty cache.
    pub fn new(max_cache_size: usize, max_object_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                lru: LruCache::unbounded(),
                total_size: 0,
            }),
            max_cache_size,
            max_object_size,
        }
    }

    /// Create a cache sized from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_cache_size, config.max_object_size)
    }

    /// Fetch a payload and mark it most recently used.
    pub fn lookup(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock();
        let hit = inner.lru.get(key).cloned();
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Store `payload` under `key` as the most recently used entry.
    ///
    /// Returns false, leaving the cache untouched, if the payload is larger
    /// than a single object may be or larger than the whole cache.
    pub fn insert(&self, key: String, payload: Bytes) -> bool {
        let size = payload.len();
        if size > self.max_object_size || size > self.max_cache_size {
            tracing::debug!(key = %key, size, "Payload too large to cache");
            return false;
        }

        let mut inner = self.inner.lock();
        if let Some(old) = inner.lru.pop(&key) {
            inner.total_size -= old.len();
        }
        while inner.total_size + size > self.max_cache_size {
            if !inner.pop_lru() {
                break;
            }
        }

        inner.total_size += size;
        inner.lru.put(key, payload);
        inner.publish_size();
        true
    }

    /// Drop the least recently used entry. Returns false if the cache was empty.
    pub fn evict_one(&self) -> bool {
        let mut inner = self.inner.lock();
        let evicted = inner.pop_lru();
        if evicted {
            inner.publish_size();
        }
        evicted
    }

    /// Whether `key` is cached, without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().lru.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all cached payload sizes.
    pub fn total_size(&self) -> usize {
        self.inner.lock().total_size
    }

    /// Cached keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().lru.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn payload(len: usize) -> Bytes {
        Bytes::from(vec![b'x'; len])
    }

    fn assert_invariants(cache: &ObjectCache) {
        let keys = cache.keys();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "duplicate keys: {keys:?}");
        assert!(cache.total_size() <= cache.max_cache_size());
    }

    #[test]
    fn lookup_miss_and_hit() {
        let cache = ObjectCache::new(100, 50);
        assert!(cache.lookup("http://a/").is_none());

        assert!(cache.insert("http://a/".into(), Bytes::from_static(b"hello")));
        assert_eq!(cache.lookup("http://a/").unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(cache.total_size(), 5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_exact_strings() {
        let cache = ObjectCache::new(100, 50);
        cache.insert("http://a/x".into(), payload(1));
        assert!(cache.lookup("http://A/x").is_none());
        assert!(cache.lookup("http://a/x/").is_none());
    }

    #[test]
    fn oversized_objects_are_never_inserted() {
        let cache = ObjectCache::new(100, 10);
        assert!(cache.insert("ok".into(), payload(10)));
        assert!(!cache.insert("big".into(), payload(11)));
        assert!(!cache.contains("big"));
        assert_eq!(cache.total_size(), 10);
    }

    #[test]
    fn payload_larger_than_cache_leaves_entries_alone() {
        // object cap above capacity is rejected by config validation, but the
        // cache must still not empty itself for a payload it cannot hold
        let cache = ObjectCache::new(10, 50);
        cache.insert("a".into(), payload(4));
        cache.insert("b".into(), payload(4));
        assert!(!cache.insert("c".into(), payload(11)));
        assert_eq!(cache.keys(), vec!["b", "a"]);
    }

    #[test]
    fn oldest_entry_evicted_first() {
        let cache = ObjectCache::new(100, 60);
        cache.insert("first".into(), payload(60));
        cache.insert("second".into(), payload(60));

        assert!(!cache.contains("first"));
        assert_eq!(cache.lookup("second").unwrap().len(), 60);
        assert_eq!(cache.total_size(), 60);
    }

    #[test]
    fn least_recently_touched_is_evicted() {
        let cache = ObjectCache::new(30, 10);
        cache.insert("a".into(), payload(10));
        cache.insert("b".into(), payload(10));
        cache.insert("c".into(), payload(10));

        // touch a, so b becomes the LRU entry
        assert!(cache.lookup("a").is_some());
        cache.insert("d".into(), payload(10));

        assert!(!cache.contains("b"));
        assert_eq!(cache.keys(), vec!["d", "a", "c"]);
    }

    #[test]
    fn eviction_frees_enough_room() {
        let cache = ObjectCache::new(30, 25);
        cache.insert("a".into(), payload(10));
        cache.insert("b".into(), payload(10));
        cache.insert("c".into(), payload(10));
        cache.insert("d".into(), payload(25));

        assert_eq!(cache.keys(), vec!["d"]);
        assert_eq!(cache.total_size(), 25);
    }

    #[test]
    fn repeated_lookup_keeps_order() {
        let cache = ObjectCache::new(100, 10);
        for key in ["a", "b", "c"] {
            cache.insert(key.into(), payload(1));
        }
        cache.lookup("a");
        let order = cache.keys();
        cache.lookup("a");
        cache.lookup("a");
        assert_eq!(cache.keys(), order);
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let cache = ObjectCache::new(100, 50);
        cache.insert("a".into(), payload(10));
        cache.insert("b".into(), payload(10));
        cache.insert("a".into(), payload(30));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.total_size(), 40);
        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.lookup("a").unwrap().len(), 30);
    }

    #[test]
    fn replacement_does_not_evict_itself() {
        let cache = ObjectCache::new(20, 20);
        cache.insert("a".into(), payload(15));
        cache.insert("b".into(), payload(5));
        cache.insert("a".into(), payload(15));

        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.total_size(), 20);
    }

    #[test]
    fn evict_one_removes_lru() {
        let cache = ObjectCache::new(100, 10);
        assert!(!cache.evict_one());

        cache.insert("a".into(), payload(3));
        cache.insert("b".into(), payload(4));
        assert!(cache.evict_one());
        assert_eq!(cache.keys(), vec!["b"]);
        assert_eq!(cache.total_size(), 4);

        assert!(cache.evict_one());
        assert!(cache.is_empty());
        assert_eq!(cache.total_size(), 0);
    }

    #[test]
    fn contains_does_not_promote() {
        let cache = ObjectCache::new(20, 10);
        cache.insert("a".into(), payload(10));
        cache.insert("b".into(), payload(10));
        assert!(cache.contains("a"));
        cache.insert("c".into(), payload(10));
        assert!(!cache.contains("a"));
    }

    #[test]
    fn bound_holds_over_mixed_sequence() {
        let cache = ObjectCache::new(1000, 300);
        for i in 0..200usize {
            let key = format!("k{}", i % 17);
            let size = (i * 37) % 301;
            cache.insert(key.clone(), payload(size));
            assert_invariants(&cache);
            if i % 3 == 0 {
                cache.lookup(&format!("k{}", i % 5));
            }
            if i % 11 == 0 {
                cache.evict_one();
            }
            assert_invariants(&cache);
        }
    }

    #[test]
    fn payload_outlives_eviction() {
        let cache = ObjectCache::new(10, 10);
        cache.insert("a".into(), Bytes::from_static(b"0123456789"));
        let held = cache.lookup("a").unwrap();
        cache.insert("b".into(), payload(10));
        assert!(!cache.contains("a"));
        assert_eq!(&held[..], b"0123456789");
    }

    #[test]
    fn concurrent_access_keeps_invariants() {
        let cache = Arc::new(ObjectCache::new(5_000, 500));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500usize {
                        let key = format!("http://origin/{}", (i + t) % 40);
                        if i % 2 == 0 {
                            cache.insert(key, payload((i * 13 + t) % 500));
                        } else if let Some(bytes) = cache.lookup(&key) {
                            assert!(bytes.iter().all(|b| *b == b'x'));
                        }
                        assert!(cache.total_size() <= 5_000);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_invariants(&cache);
    }
}
