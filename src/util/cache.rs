//! Bounded memoization of operation results.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::error::{DecorError, Result};

/// Caller-owned result cache with LRU eviction and optional TTL.
///
/// Clones share the same table. Failed operations are never cached.
pub struct ResultCache<K, V> {
    inner: Arc<Mutex<LruCache<K, CacheEntry<V>>>>,
    ttl: Option<Duration>,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K, V> Clone for ResultCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.lock();
        f.debug_struct("ResultCache")
            .field("capacity", &cache.cap())
            .field("ttl", &self.ttl)
            .field("len", &cache.len())
            .finish()
    }
}

impl<K, V> ResultCache<K, V> {
    fn lock(&self) -> MutexGuard<'_, LruCache<K, CacheEntry<V>>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| DecorError::configuration("cache capacity must be at least 1"))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl: None,
        })
    }

    /// Entries older than `ttl` are treated as missing.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.lock();
        let entry = cache.get(key)?;
        if !self.is_expired(entry) {
            return Some(entry.value.clone());
        }

        cache.pop(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let mut cache = self.lock();
        // Expired entries go first so a full cache never evicts a live one for them.
        if cache.len() >= cache.cap().get() && !cache.contains(&key) {
            self.purge_expired(&mut cache);
        }

        cache.put(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        let mut cache = self.lock();
        self.purge_expired(&mut cache);
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Return the cached value for `key`, or run `operation` and cache its success.
    pub fn get_or_try_insert_with<E, F>(
        &self,
        name: &str,
        key: K,
        operation: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.cached(name, &key) {
            return Ok(value);
        }
        let value = operation()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Async counterpart of [`ResultCache::get_or_try_insert_with`].
    ///
    /// The lock is not held while the operation runs, so concurrent misses on
    /// the same key may each run the operation; the last one to finish wins.
    pub async fn get_or_try_insert_with_async<E, F, Fut>(
        &self,
        name: &str,
        key: K,
        operation: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.cached(name, &key) {
            return Ok(value);
        }
        let value = operation().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn cached(&self, name: &str, key: &K) -> Option<V> {
        let value = self.get(key)?;
        tracing::debug!(
            operation = name,
            "Returning cached result for {} with arguments {:?}",
            name,
            key
        );
        Some(value)
    }

    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }

    fn purge_expired(&self, cache: &mut LruCache<K, CacheEntry<V>>) {
        if self.ttl.is_none() {
            return;
        }
        let expired: Vec<K> = cache
            .iter()
            .filter(|(_, entry)| self.is_expired(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            cache.pop(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            ResultCache::<u32, u32>::new(0),
            Err(DecorError::Configuration(_))
        ));
    }

    #[test]
    fn reinserting_existing_key_does_not_evict() {
        let cache = ResultCache::new(2).unwrap();
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 3);

        assert_eq!(cache.get(&"a"), Some(3));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_refreshes_recency() {
        let cache = ResultCache::new(2).unwrap();
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 3);
        cache.insert("c", 4);

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(3));
        assert_eq!(cache.get(&"c"), Some(4));
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn full_cache_drops_expired_entries_before_live_ones() {
        let cache = ResultCache::new(2).unwrap().with_ttl(Duration::from_millis(200));
        cache.insert("old", 1);
        std::thread::sleep(Duration::from_millis(120));
        cache.insert("young", 2);
        // "old" becomes most recently used, leaving "young" next in line for LRU eviction.
        assert_eq!(cache.get(&"old"), Some(1));
        std::thread::sleep(Duration::from_millis(100));
        cache.insert("newest", 3);

        assert_eq!(cache.get(&"old"), None);
        assert_eq!(cache.get(&"young"), Some(2));
        assert_eq!(cache.get(&"newest"), Some(3));
    }
}
