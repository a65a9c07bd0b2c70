use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::CacheError;
use crate::memory::MemoryCache;
use crate::sqlite::SqliteCache;
use crate::JsonCache;

/// Read-through cache: checks moka (hot) → SQLite (shared) → None.
///
/// On SQLite hit, promotes the entry to the moka hot cache for the rest of
/// its lifetime. Writes go to both tiers.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
/// The lock is never held across an await.
pub struct TieredCache {
    memory: MemoryCache,
    sqlite: Mutex<SqliteCache>,
}

impl TieredCache {
    pub fn new(sqlite: SqliteCache, max_capacity: u64, memory_max_ttl: Duration) -> Self {
        Self {
            memory: MemoryCache::new(max_capacity, memory_max_ttl),
            sqlite: Mutex::new(sqlite),
        }
    }
}

fn remaining_ttl(expires_at: &str) -> Option<Duration> {
    let expires_at = DateTime::parse_from_rfc3339(expires_at).ok()?;
    (expires_at.with_timezone(&Utc) - Utc::now()).to_std().ok()
}

#[async_trait]
impl JsonCache for TieredCache {
    async fn get_json(&self, key: &str) -> Result<Option<String>, CacheError> {
        // 1. Check moka hot cache
        if let Some(json) = self.memory.get(key).await {
            return Ok(Some(json));
        }

        // 2. Check SQLite (TTL filtering happens in the query)
        let row = {
            let sqlite = self
                .sqlite
                .lock()
                .map_err(|e| CacheError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
            sqlite.get(key)?
        };

        if let Some(row) = row {
            if let Some(ttl) = remaining_ttl(&row.expires_at) {
                debug!(key, "Promoting SQLite cache hit to memory");
                self.memory
                    .insert(key.to_string(), row.value_json.clone(), ttl)
                    .await;
            }
            return Ok(Some(row.value_json));
        }

        Ok(None)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        {
            let sqlite = self
                .sqlite
                .lock()
                .map_err(|e| CacheError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
            sqlite.put(key, &value, ttl)?;
        }
        self.memory.insert(key.to_string(), value, ttl).await;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let sqlite = self
            .sqlite
            .lock()
            .map_err(|e| CacheError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
        sqlite.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_cache() -> TieredCache {
        let sqlite = SqliteCache::open_in_memory().unwrap();
        sqlite
            .put(
                "cg:market:ethereum",
                r#"{"price_usd": 3500.0}"#,
                Duration::from_secs(300),
            )
            .unwrap();
        sqlite
            .put("cg:hist:ethereum:60", "[1.0,2.0,3.0]", Duration::from_secs(300))
            .unwrap();

        TieredCache::new(sqlite, 100, Duration::from_secs(600))
    }

    #[tokio::test]
    async fn read_through_sqlite_to_moka() {
        let cache = setup_cache();

        // First read should come from SQLite
        let value = cache.get_json("cg:market:ethereum").await.unwrap();
        assert!(value.unwrap().contains("3500"));

        // After the first read, the entry should be promoted to moka.
        let raw = cache.memory.get("cg:market:ethereum").await;
        assert!(raw.is_some());
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let cache = setup_cache();
        assert!(cache.get_json("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_writes_both_tiers() {
        let cache = setup_cache();
        cache
            .set_json("cp:news:ETH", "{}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.memory.get("cp:news:ETH").await.is_some());
        let sqlite = cache.sqlite.lock().unwrap();
        assert!(sqlite.get("cp:news:ETH").unwrap().is_some());
    }

    #[tokio::test]
    async fn typed_read_through() {
        let cache = setup_cache();
        let closes: Option<Vec<f64>> = crate::get_typed(&cache, "cg:hist:ethereum:60")
            .await
            .unwrap();
        assert_eq!(closes, Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn purge_drops_expired_sqlite_rows() {
        let sqlite = SqliteCache::open_in_memory().unwrap();
        sqlite.put("cg:market:stale", "1", Duration::ZERO).unwrap();
        sqlite.put("cg:market:fresh", "2", Duration::from_secs(300)).unwrap();
        let cache = TieredCache::new(sqlite, 100, Duration::from_secs(600));

        let dyn_cache: &dyn JsonCache = &cache;
        assert_eq!(dyn_cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.sqlite.lock().unwrap().count().unwrap(), 1);
        assert_eq!(MemoryCache::new(10, Duration::from_secs(1)).purge_expired().unwrap(), 0);
    }

    #[test]
    fn remaining_ttl_of_past_timestamp_is_none() {
        let past = (Utc::now() - chrono::Duration::seconds(10)).to_rfc3339();
        assert!(remaining_ttl(&past).is_none());
        let future = (Utc::now() + chrono::Duration::seconds(100)).to_rfc3339();
        assert!(remaining_ttl(&future).is_some());
    }
}
