//! Bounded TTL cache for facet query results.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::metrics::FACET_CACHE_LOOKUPS;

struct CachedList {
    stored_at: Instant,
    values: Arc<Vec<String>>,
}

/// Explicitly owned facet-list cache with capacity and TTL bounds.
///
/// Held by the query engine; invalidated wholesale after ingestion writes.
pub struct FacetCache {
    inner: Mutex<LruCache<String, CachedList>>,
    ttl: Duration,
}

impl FacetCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<String>>> {
        let mut cache = self.inner.lock().unwrap();
        let hit = match cache.get(key) {
            Some(cached) if cached.stored_at.elapsed() <= self.ttl => {
                Some(Arc::clone(&cached.values))
            }
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        };
        FACET_CACHE_LOOKUPS
            .with_label_values(&[if hit.is_some() { "hit" } else { "miss" }])
            .inc();
        hit
    }

    pub fn put(&self, key: String, values: Vec<String>) -> Arc<Vec<String>> {
        let values = Arc::new(values);
        self.inner.lock().unwrap().put(
            key,
            CachedList {
                stored_at: Instant::now(),
                values: Arc::clone(&values),
            },
        );
        values
    }

    /// Drop everything; called after the store was written to.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_cached_values() {
        let cache = FacetCache::new(4, Duration::from_secs(60));
        cache.put("channels".to_string(), vec!["ARD".to_string()]);

        let values = cache.get("channels").unwrap();
        assert_eq!(*values, vec!["ARD".to_string()]);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = FacetCache::new(4, Duration::from_millis(0));
        cache.put("channels".to_string(), vec!["ARD".to_string()]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("channels").is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = FacetCache::new(2, Duration::from_secs(60));
        cache.put("a".to_string(), vec![]);
        cache.put("b".to_string(), vec![]);
        cache.get("a");
        cache.put("c".to_string(), vec![]);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = FacetCache::new(4, Duration::from_secs(60));
        cache.put("channels".to_string(), vec!["ARD".to_string()]);
        cache.clear();
        assert!(cache.get("channels").is_none());
    }
}
