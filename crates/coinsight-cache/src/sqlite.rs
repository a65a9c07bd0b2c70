use std::time::Duration;

use chrono::Utc;
use coinsight_models::cache_schema::CacheRow;
use rusqlite::Connection;

use crate::error::CacheError;

/// Shared SQLite cache tier.
///
/// Lets several processes (CLI runs, the daily daemon) reuse provider
/// responses. Entries past `expires_at` are never returned.
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open (or create) the cache database. Enables WAL mode.
    pub fn open(path: &str) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(coinsight_models::cache_schema::CACHE_TABLE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Useful for testing - creates the schema automatically.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(coinsight_models::cache_schema::CACHE_TABLE_DDL)?;
        Ok(Self { conn })
    }

    /// Get a single cache entry by key. Returns None if not found or expired.
    pub fn get(&self, key: &str) -> Result<Option<CacheRow>, CacheError> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, value_json, created_at, expires_at \
             FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
        )?;

        let result = stmt.query_row(rusqlite::params![key, now], |row| {
            Ok(CacheRow {
                key: row.get(0)?,
                value_json: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CacheError::Sqlite(e)),
        }
    }

    /// Insert or replace an entry that expires `ttl` from now.
    pub fn put(&self, key: &str, value_json: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Unavailable(format!("TTL out of range: {e}")))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value_json, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                key,
                value_json,
                now.to_rfc3339(),
                (now + ttl).to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete all expired entries. Returns the number of rows deleted.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now().to_rfc3339();
        let deleted = self.conn.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?1",
            rusqlite::params![now],
        )?;
        Ok(deleted)
    }

    pub fn count(&self) -> Result<usize, CacheError> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let cache = SqliteCache::open_in_memory().unwrap();
        cache
            .put("cg:market:ethereum", r#"{"price": 1}"#, Duration::from_secs(60))
            .unwrap();

        let row = cache.get("cg:market:ethereum").unwrap().unwrap();
        assert_eq!(row.value_json, r#"{"price": 1}"#);
    }

    #[test]
    fn get_missing_key() {
        let cache = SqliteCache::open_in_memory().unwrap();
        assert!(cache.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn expired_entries_are_hidden_and_purged() {
        let cache = SqliteCache::open_in_memory().unwrap();
        cache.put("stale", "1", Duration::ZERO).unwrap();
        cache.put("fresh", "2", Duration::from_secs(300)).unwrap();

        assert!(cache.get("stale").unwrap().is_none());
        assert_eq!(cache.count().unwrap(), 2);

        let deleted = cache.purge_expired().unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(cache.count().unwrap(), 1);
    }

    #[test]
    fn put_replaces_existing() {
        let cache = SqliteCache::open_in_memory().unwrap();
        cache.put("k", "1", Duration::from_secs(60)).unwrap();
        cache.put("k", "2", Duration::from_secs(60)).unwrap();

        assert_eq!(cache.count().unwrap(), 1);
        assert_eq!(cache.get("k").unwrap().unwrap().value_json, "2");
    }

    #[test]
    fn wal_mode_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let cache = SqliteCache::open(path.to_str().unwrap()).unwrap();
        cache.put("k", "v", Duration::from_secs(60)).unwrap();
        assert!(cache.get("k").unwrap().is_some());
    }
}
