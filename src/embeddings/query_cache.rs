use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// LRU cache of query vectors, so repeating a question doesn't re-encode it.
///
/// Keys are the query text exactly as sent to the model.
pub struct QueryEmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl QueryEmbeddingCache {
    /// Create a cache holding at most `capacity` queries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    // A panic while holding the lock can't leave the LRU half-updated in a way
    // that matters for a cache, so recover the guard instead of propagating.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        self.lock().get(query).cloned()
    }

    pub fn put(&self, query: String, vector: Vec<f32>) {
        self.lock().put(query, vector);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = QueryEmbeddingCache::new(10);
        cache.put("cheating".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("cheating"), Some(vec![1.0, 2.0]));
        assert!(cache.get("theft").is_none());
    }

    #[test]
    fn test_recently_used_survives_eviction() {
        let cache = QueryEmbeddingCache::new(2);
        cache.put("section 420".to_string(), vec![1.0]);
        cache.put("section 302".to_string(), vec![2.0]);
        let _ = cache.get("section 420");
        cache.put("section 379".to_string(), vec![3.0]);

        assert!(cache.get("section 420").is_some());
        assert!(cache.get("section 302").is_none());
        assert!(cache.get("section 379").is_some());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = QueryEmbeddingCache::new(0);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = QueryEmbeddingCache::new(4);
        cache.put("a".to_string(), vec![1.0]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
