//! Keyed TTL cache shared by the OAuth flow.
//!
//! The state nonce and the exchanged credentials both live here: written
//! with a short expiry, read back at most once. The backend is either
//! process-local memory (tests, single instance) or Redis (anything
//! shared), selected by configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

pub mod config;
pub mod memory;
pub mod redis;

use crate::cache::config::CacheConfig;
use crate::health::{HealthCheckResult, HealthChecker};

/// Cache error types
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Key not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for types stored in the cache.
///
/// The prefix namespaces keys per type so the same `{org_id}:{user_id}`
/// key can hold both a state entry and a credential entry.
pub trait CachedObject:
    Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static
{
    fn cache_prefix() -> &'static str;

    /// Type-specific TTL applied when `set` is called without one.
    fn default_ttl() -> Option<Duration> {
        None
    }
}

/// Shared memory store backend
type SharedMemoryStore = Arc<RwLock<HashMap<String, Box<dyn std::any::Any + Send + Sync>>>>;

/// Typed cache backend
#[derive(Clone)]
pub enum TypedCacheBackend<T> {
    Memory(memory::MemoryCache<T>), // typed in-process storage
    Redis(redis::RedisCache<T>),    // postcard storage
}

/// Cache manager - creates TypedCache instances over the configured backend
#[derive(Clone)]
pub struct CacheManager {
    config: CacheConfig,
    redis_client: Option<::redis::Client>,
    memory_store: Option<SharedMemoryStore>,
}

impl CacheManager {
    /// Create new cache manager with memory backend (for testing/single instance)
    pub fn new_memory() -> Self {
        Self {
            config: CacheConfig {
                backend: "memory".to_string(),
                ..Default::default()
            },
            redis_client: None,
            memory_store: Some(Arc::new(RwLock::new(HashMap::new()))),
        }
    }

    /// Create cache manager from configuration
    pub async fn new_from_config(config: &CacheConfig) -> CacheResult<Self> {
        let redis_client = if config.backend == "redis" {
            let client = ::redis::Client::open(config.redis_url.as_str())
                .map_err(|e| CacheError::Connection(format!("Redis client creation failed: {}", e)))?;

            // Fail early if Redis is not reachable
            let mut conn = client
                .get_multiplexed_tokio_connection()
                .await
                .map_err(|e| CacheError::Connection(format!("Redis connection failed: {}", e)))?;

            ::redis::cmd("PING")
                .query_async::<String>(&mut conn)
                .await
                .map_err(|e| CacheError::Connection(format!("Redis ping failed: {}", e)))?;

            Some(client)
        } else {
            None
        };

        let memory_store = if config.backend == "memory" {
            Some(Arc::new(RwLock::new(HashMap::new())))
        } else {
            None
        };

        Ok(Self {
            config: config.clone(),
            redis_client,
            memory_store,
        })
    }

    fn create_backend<T: CachedObject>(&self) -> TypedCacheBackend<T> {
        if let Some(client) = &self.redis_client {
            let redis = redis::RedisCache::from_client(
                client.clone(),
                self.config.redis_key_prefix.clone(),
            );
            TypedCacheBackend::Redis(redis)
        } else if let Some(store) = &self.memory_store {
            TypedCacheBackend::Memory(memory::MemoryCache::from_shared_store(store.clone()))
        } else {
            panic!("No backend initialized - this should never happen")
        }
    }

    /// Get a typed cache for type T
    pub fn cache<T: CachedObject>(&self) -> TypedCache<T> {
        TypedCache::new(self.create_backend())
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        match self.config.backend.as_str() {
            "redis" => {
                match redis::RedisCache::<()>::new(
                    &self.config.redis_url,
                    self.config.redis_key_prefix.clone(),
                ) {
                    Ok(redis_cache) => match redis_cache.ping().await {
                        Ok(_) => HealthCheckResult::healthy_with_details(serde_json::json!({
                            "backend": "redis",
                            "connection": "ok"
                        })),
                        Err(err) => HealthCheckResult::unhealthy_with_details(
                            "Redis health check failed".to_string(),
                            serde_json::json!({
                                "backend": "redis",
                                "error": err.to_string()
                            }),
                        ),
                    },
                    Err(err) => HealthCheckResult::unhealthy_with_details(
                        "Redis client creation failed".to_string(),
                        serde_json::json!({
                            "backend": "redis",
                            "error": err.to_string()
                        }),
                    ),
                }
            }
            // Memory cache always passes
            _ => HealthCheckResult::healthy_with_details(serde_json::json!({
                "backend": "memory"
            })),
        }
    }

    fn backend_type(&self) -> &str {
        &self.config.backend
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new_memory()
    }
}

#[async_trait::async_trait]
impl HealthChecker for CacheManager {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthCheckResult {
        self.health_check().await
    }

    fn info(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "service": "Cache Manager",
            "backend": self.backend_type()
        }))
    }
}

/// Typed cache instance for a specific type T
#[derive(Clone)]
pub struct TypedCache<T: CachedObject> {
    backend: TypedCacheBackend<T>,
    prefix: &'static str,
    default_ttl: Option<Duration>,
    _phantom: PhantomData<T>,
}

impl<T: CachedObject> TypedCache<T> {
    fn new(backend: TypedCacheBackend<T>) -> Self {
        Self {
            backend,
            prefix: T::cache_prefix(),
            default_ttl: T::default_ttl(),
            _phantom: PhantomData,
        }
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Get value from cache
    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let cache_key = self.cache_key(key);
        match &self.backend {
            TypedCacheBackend::Memory(cache) => cache.get(&cache_key).await,
            TypedCacheBackend::Redis(cache) => cache.get(&cache_key).await,
        }
    }

    /// Set value in cache with an explicit TTL
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let cache_key = self.cache_key(key);
        let ttl = ttl.or(self.default_ttl);

        match &self.backend {
            TypedCacheBackend::Memory(cache) => cache.set(&cache_key, value, ttl).await,
            TypedCacheBackend::Redis(cache) => cache.set(&cache_key, value, ttl).await,
        }
    }

    /// Set with the type's default TTL
    pub async fn set(&self, key: &str, value: &T) -> CacheResult<()> {
        self.set_with_ttl(key, value, None).await
    }

    /// Delete value from cache
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let cache_key = self.cache_key(key);
        match &self.backend {
            TypedCacheBackend::Memory(cache) => cache.delete(&cache_key).await,
            TypedCacheBackend::Redis(cache) => cache.delete(&cache_key).await,
        }
    }

    /// Check if key exists in cache
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let cache_key = self.cache_key(key);
        match &self.backend {
            TypedCacheBackend::Memory(cache) => cache.exists(&cache_key).await,
            TypedCacheBackend::Redis(cache) => cache.exists(&cache_key).await,
        }
    }
}
