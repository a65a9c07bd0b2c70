/// Table backing the optional persistent cache tier.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS cache_entries (
///     key         TEXT PRIMARY KEY,
///     value_json  TEXT NOT NULL,
///     created_at  TEXT NOT NULL,
///     expires_at  TEXT NOT NULL
/// );
///
/// CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
/// ```
pub const CACHE_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS cache_entries (
    key         TEXT PRIMARY KEY,
    value_json  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
";

/// Key pattern conventions for provider response caching.
///
/// - Coin list: `cg:coins:list:v1`
/// - Market snapshot: `cg:market:{coin_id}`
/// - Daily closes: `cg:hist:{coin_id}:{days}`
/// - News: `cp:news:{symbol}`
/// - DEX pairs: `dex:pair:{address}` (lowercased)
/// - Contract metadata: `es:contract:{address}` (lowercased)
pub mod key_patterns {
    pub const COIN_LIST: &str = "cg:coins:list:v1";

    pub fn market(coin_id: &str) -> String {
        format!("cg:market:{coin_id}")
    }

    pub fn closes(coin_id: &str, days: u32) -> String {
        format!("cg:hist:{coin_id}:{days}")
    }

    pub fn news(symbol: &str) -> String {
        format!("cp:news:{symbol}")
    }

    pub fn dex_pairs(address: &str) -> String {
        format!("dex:pair:{}", address.to_lowercase())
    }

    pub fn contract(address: &str) -> String {
        format!("es:contract:{}", address.to_lowercase())
    }
}

/// A raw cache row as read from SQLite.
#[derive(Debug, Clone)]
pub struct CacheRow {
    pub key: String,
    pub value_json: String,
    pub created_at: String,
    pub expires_at: String,
}
