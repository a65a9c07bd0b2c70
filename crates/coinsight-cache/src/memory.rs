use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;

use crate::error::CacheError;
use crate::JsonCache;

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    expires_at: Instant,
}

/// In-memory hot cache backed by moka.
///
/// Each entry carries its own deadline; `max_ttl` bounds how long moka keeps
/// any entry regardless of the requested TTL.
pub struct MemoryCache {
    inner: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, max_ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(max_ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let entry = self.inner.get(key).await?;
        if entry.expires_at <= Instant::now() {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry.value.to_string())
    }

    pub async fn insert(&self, key: String, value: String, ttl: Duration) {
        let entry = Entry {
            value: Arc::from(value),
            expires_at: Instant::now() + ttl,
        };
        self.inner.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[async_trait]
impl JsonCache for MemoryCache {
    async fn get_json(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.get(key).await)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key.to_string(), value, ttl).await;
        Ok(())
    }
}
