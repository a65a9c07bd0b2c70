use serde::{Deserialize, Serialize};

use crate::agent_message::DebateConfig;
use crate::alert::AlertRule;

/// Top-level configuration for Coinsight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CoinsightConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub debate: DebateSettings,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
}

/// Endpoints and credentials for the external data providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_coingecko_base")]
    pub coingecko_base: String,
    #[serde(default = "default_etherscan_base")]
    pub etherscan_base: String,
    #[serde(default = "default_dexscreener_base")]
    pub dexscreener_base: String,
    #[serde(default = "default_covalent_base")]
    pub covalent_base: String,
    #[serde(default = "default_cryptopanic_base")]
    pub cryptopanic_base: String,
    /// Without a key the corresponding provider always reports no data.
    pub etherscan_key: Option<String>,
    pub covalent_key: Option<String>,
    pub cryptopanic_key: Option<String>,
    /// EVM chain queried for holder data.
    #[serde(default = "default_chain_id")]
    pub chain_id: u32,
    #[serde(default = "default_holders_limit")]
    pub holders_limit: u32,
    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            coingecko_base: default_coingecko_base(),
            etherscan_base: default_etherscan_base(),
            dexscreener_base: default_dexscreener_base(),
            covalent_base: default_covalent_base(),
            cryptopanic_base: default_cryptopanic_base(),
            etherscan_key: None,
            covalent_key: None,
            cryptopanic_key: None,
            chain_id: default_chain_id(),
            holders_limit: default_holders_limit(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ProvidersConfig {
    /// Override keys and the CoinGecko base from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Environment values take precedence over file values; empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(base) = get("COINGECKO_BASE") {
            self.coingecko_base = base;
        }
        if let Some(key) = get("ETHERSCAN_KEY") {
            self.etherscan_key = Some(key);
        }
        if let Some(key) = get("COVALENT_API_KEY") {
            self.covalent_key = Some(key);
        }
        if let Some(key) = get("CRYPTOPANIC_KEY") {
            self.cryptopanic_key = Some(key);
        }
    }
}

/// Configuration for the provider response cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries in the in-memory moka cache.
    #[serde(default = "default_memory_max_capacity")]
    pub memory_max_capacity: u64,
    /// Optional shared SQLite tier behind the in-memory cache.
    pub sqlite_path: Option<String>,
    #[serde(default = "default_coin_list_ttl")]
    pub coin_list_ttl_seconds: u64,
    #[serde(default = "default_market_ttl")]
    pub market_ttl_seconds: u64,
    #[serde(default = "default_closes_ttl")]
    pub closes_ttl_seconds: u64,
    #[serde(default = "default_news_ttl")]
    pub news_ttl_seconds: u64,
    #[serde(default = "default_dex_ttl")]
    pub dex_ttl_seconds: u64,
    #[serde(default = "default_contract_ttl")]
    pub contract_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_max_capacity: default_memory_max_capacity(),
            sqlite_path: None,
            coin_list_ttl_seconds: default_coin_list_ttl(),
            market_ttl_seconds: default_market_ttl(),
            closes_ttl_seconds: default_closes_ttl(),
            news_ttl_seconds: default_news_ttl(),
            dex_ttl_seconds: default_dex_ttl(),
            contract_ttl_seconds: default_contract_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database holding agent runs, consensus runs and daily signals.
    #[serde(default = "default_store_path")]
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Deadline for gathering all signals of one analysis.
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            analysis_timeout_ms: default_analysis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebateSettings {
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_quorum")]
    pub quorum: f64,
    /// Total time budget for one debate in seconds.
    #[serde(default = "default_debate_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DebateSettings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            quorum: default_quorum(),
            timeout_seconds: default_debate_timeout(),
        }
    }
}

impl DebateSettings {
    pub fn config(&self) -> DebateConfig {
        DebateConfig {
            rounds: self.rounds,
            quorum: self.quorum,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    /// Number of top market-cap tokens scored per day.
    #[serde(default = "default_universe_limit")]
    pub universe_limit: usize,
    /// Maximum tokens processed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_schedule_hour")]
    pub schedule_hour_utc: u32,
    #[serde(default = "default_schedule_minute")]
    pub schedule_minute_utc: u32,
    #[serde(default = "default_summary_days")]
    pub summary_days: u32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            universe_limit: default_universe_limit(),
            concurrency: default_concurrency(),
            rounds: default_rounds(),
            schedule_hour_utc: default_schedule_hour(),
            schedule_minute_utc: default_schedule_minute(),
            summary_days: default_summary_days(),
        }
    }
}

fn default_coingecko_base() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}
fn default_etherscan_base() -> String {
    "https://api.etherscan.io/api".to_string()
}
fn default_dexscreener_base() -> String {
    "https://api.dexscreener.com/latest/dex".to_string()
}
fn default_covalent_base() -> String {
    "https://api.covalenthq.com/v1".to_string()
}
fn default_cryptopanic_base() -> String {
    "https://cryptopanic.com/api/v1".to_string()
}
fn default_chain_id() -> u32 {
    1
}
fn default_holders_limit() -> u32 {
    10
}
fn default_request_timeout_ms() -> u64 {
    8_000
}
fn default_memory_max_capacity() -> u64 {
    10_000
}
fn default_coin_list_ttl() -> u64 {
    12 * 60 * 60
}
fn default_market_ttl() -> u64 {
    60
}
fn default_closes_ttl() -> u64 {
    30 * 60
}
fn default_news_ttl() -> u64 {
    300
}
fn default_dex_ttl() -> u64 {
    60
}
fn default_contract_ttl() -> u64 {
    60 * 60
}
fn default_store_path() -> String {
    "data/coinsight.db".to_string()
}
fn default_analysis_timeout_ms() -> u64 {
    10_000
}
fn default_rounds() -> u32 {
    3
}
fn default_quorum() -> f64 {
    0.5
}
fn default_debate_timeout() -> u64 {
    60
}
fn default_universe_limit() -> usize {
    100
}
fn default_concurrency() -> usize {
    4
}
fn default_schedule_hour() -> u32 {
    5
}
fn default_schedule_minute() -> u32 {
    10
}
fn default_summary_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn roundtrip_coinsight_config() {
        let config = CoinsightConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: CoinsightConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: CoinsightConfig = toml::from_str("").unwrap();
        assert_eq!(config.debate.rounds, 3);
        assert_eq!(config.backtest.universe_limit, 100);
        assert_eq!(config.backtest.schedule_hour_utc, 5);
        assert_eq!(config.backtest.schedule_minute_utc, 10);
        assert_eq!(config.providers.chain_id, 1);
        assert!(config.providers.etherscan_key.is_none());
        assert!(config.alerts.is_empty());
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[providers]
etherscan_key = "abc"
request_timeout_ms = 3000

[cache]
memory_max_capacity = 500
sqlite_path = "/tmp/coinsight_cache.db"
market_ttl_seconds = 30

[store]
sqlite_path = "/tmp/coinsight.db"

[scoring]
analysis_timeout_ms = 4000

[debate]
rounds = 2
timeout_seconds = 20

[backtest]
universe_limit = 25
concurrency = 2

[[alerts]]
id = "00000000-0000-0000-0000-000000000002"
token = "BTC"
condition = { type = "consensus_flip" }
"#;

        let config: CoinsightConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.etherscan_key.as_deref(), Some("abc"));
        assert_eq!(config.providers.request_timeout_ms, 3000);
        assert_eq!(
            config.cache.sqlite_path.as_deref(),
            Some("/tmp/coinsight_cache.db")
        );
        assert_eq!(config.cache.market_ttl_seconds, 30);
        assert_eq!(config.cache.news_ttl_seconds, 300);
        assert_eq!(config.scoring.analysis_timeout_ms, 4000);
        assert_eq!(config.debate.config().rounds, 2);
        assert_eq!(config.debate.quorum, 0.5);
        assert_eq!(config.backtest.concurrency, 2);
        assert_eq!(config.alerts.len(), 1);
    }

    #[test]
    fn env_overrides_file_keys() {
        let mut providers = ProvidersConfig {
            etherscan_key: Some("from-file".to_string()),
            ..ProvidersConfig::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            ("ETHERSCAN_KEY", "from-env"),
            ("CRYPTOPANIC_KEY", ""),
            ("COINGECKO_BASE", "http://localhost:9000"),
        ]);

        providers.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(providers.etherscan_key.as_deref(), Some("from-env"));
        assert!(providers.cryptopanic_key.is_none());
        assert_eq!(providers.coingecko_base, "http://localhost:9000");
    }
}
