//! Typed payloads returned by the external data providers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot market data for a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub coin_id: String,
    pub symbol: String,
    pub price_usd: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    /// 24h change in percent (3.0 = +3%).
    pub d1_pct: f64,
    /// 7d change in percent.
    pub d7_pct: f64,
}

/// Source verification metadata for a contract address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContractMeta {
    pub verified: bool,
    pub proxy: bool,
    pub contract_name: Option<String>,
    pub implementation: Option<String>,
    pub compiler_version: Option<String>,
    pub license_type: Option<String>,
}

/// A DEX trading pair for a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DexPair {
    pub liquidity_usd: f64,
    pub volume_24h: f64,
    pub dex_id: String,
    pub chain_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holder {
    pub address: String,
    pub balance_usd: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewsVotes {
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub negative: u32,
    #[serde(default)]
    pub important: u32,
}

impl NewsVotes {
    /// `positive + 2*important - negative`.
    pub fn weighted(&self) -> i64 {
        i64::from(self.positive) + 2 * i64::from(self.important) - i64::from(self.negative)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsPost {
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub votes: NewsVotes,
}

/// Recent news for a token. An empty feed is the "no data" case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewsFeed {
    pub symbol: Option<String>,
    pub posts: Vec<NewsPost>,
}

/// One entry of the ranked backtest universe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniverseEntry {
    pub symbol: String,
    pub price_usd: Decimal,
}

/// A resolved provider coin identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinRef {
    pub id: String,
    pub symbol: String,
}
