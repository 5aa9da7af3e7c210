use super::CacheResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache entry with expiration - generic over type T
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Option<DateTime<Utc>>,
}

impl<T: Clone> CacheEntry<T> {
    fn new(data: T, ttl: Option<std::time::Duration>) -> Self {
        let expires_at = ttl
            .and_then(|duration| chrono::Duration::from_std(duration).ok())
            .map(|duration| Utc::now() + duration);
        Self { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() > exp)
    }
}

/// Shared memory store type
type SharedMemoryStore = Arc<RwLock<HashMap<String, Box<dyn std::any::Any + Send + Sync>>>>;

/// Generic in-memory cache over a store shared by all typed handles.
///
/// Expired entries are removed lazily, on the read that observes them.
#[derive(Clone)]
pub struct MemoryCache<T> {
    store: SharedMemoryStore,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create memory cache from shared store (managed by CacheManager)
    pub fn from_shared_store(store: SharedMemoryStore) -> Self {
        Self {
            store,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> MemoryCache<T> {
    /// Get value by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let store = self.store.read().await;

        if let Some(boxed_entry) = store.get(key) {
            if let Some(entry) = boxed_entry.downcast_ref::<CacheEntry<T>>() {
                if entry.is_expired() {
                    drop(store);
                    let mut store = self.store.write().await;
                    store.remove(key);
                    return Ok(None);
                }

                Ok(Some(entry.data.clone()))
            } else {
                // Type mismatch - shouldn't happen with proper key prefixing
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    /// Set value with optional expiration
    pub async fn set(
        &self,
        key: &str,
        value: &T,
        ttl: Option<std::time::Duration>,
    ) -> CacheResult<()> {
        let entry = CacheEntry::new(value.clone(), ttl);
        let boxed_entry: Box<dyn std::any::Any + Send + Sync> = Box::new(entry);

        let mut store = self.store.write().await;
        store.insert(key.to_string(), boxed_entry);

        Ok(())
    }

    /// Delete key
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let store = self.store.read().await;

        if let Some(boxed_entry) = store.get(key) {
            if let Some(entry) = boxed_entry.downcast_ref::<CacheEntry<T>>() {
                if entry.is_expired() {
                    drop(store);
                    let mut store = self.store.write().await;
                    store.remove(key);
                    return Ok(false);
                }
                Ok(true)
            } else {
                Ok(false)
            }
        } else {
            Ok(false)
        }
    }
}
