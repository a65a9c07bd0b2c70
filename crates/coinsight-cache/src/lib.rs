pub mod error;
pub mod memory;
pub mod sqlite;
pub mod tiered;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::CacheError;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use tiered::TieredCache;

/// Key/value cache for serialized provider responses.
///
/// Injected into the provider layer so nothing relies on process-wide state.
#[async_trait]
pub trait JsonCache: Send + Sync {
    async fn get_json(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_json(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop expired entries from persistent storage. Returns how many rows
    /// were removed. In-memory tiers expire on their own.
    fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}

/// Cache that stores nothing. Every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl JsonCache for NoopCache {
    async fn get_json(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_json(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Get a typed value by cache key.
pub async fn get_typed<T: DeserializeOwned>(
    cache: &dyn JsonCache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get_json(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Serialize and store a typed value.
pub async fn set_typed<T: Serialize + ?Sized>(
    cache: &dyn JsonCache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let json = serde_json::to_string(value)?;
    cache.set_json(key, json, ttl).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopCache;
        set_typed(&cache, "k", &vec![1.0, 2.0], Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<Vec<f64>> = get_typed(&cache, "k").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn typed_roundtrip_through_memory_cache() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        set_typed(&cache, "closes", &vec![1.5, 2.5], Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<Vec<f64>> = get_typed(&cache, "closes").await.unwrap();
        assert_eq!(result, Some(vec![1.5, 2.5]));
    }

    #[tokio::test]
    async fn typed_get_reports_corrupt_json() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache
            .set_json("bad", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Result<Option<Vec<f64>>, _> = get_typed(&cache, "bad").await;
        assert!(matches!(result, Err(CacheError::Json(_))));
    }
}
