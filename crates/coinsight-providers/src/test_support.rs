//! Scripted provider data for tests of the scoring engine, agents and
//! backtest.
//!
//! `FixtureSource` answers every `SignalSource` call from fields set up by
//! the test, optionally after a delay so deadline handling can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coinsight_models::{
    ContractMeta, DexPair, Holder, MarketSnapshot, NewsFeed, NewsPost, NewsVotes, UniverseEntry,
};

use crate::SignalSource;

#[derive(Default, Clone)]
pub struct FixtureSource {
    /// Keyed by upper-cased token.
    pub markets: HashMap<String, MarketSnapshot>,
    pub contract: Option<ContractMeta>,
    pub dex: Option<Vec<DexPair>>,
    pub holders: Option<Vec<Holder>>,
    pub news: NewsFeed,
    /// Keyed by the requested number of days.
    pub closes: HashMap<u32, Vec<f64>>,
    pub universe: Vec<UniverseEntry>,
    pub delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, token: &str, snapshot: MarketSnapshot) -> Self {
        self.markets.insert(token.to_uppercase(), snapshot);
        self
    }

    pub fn with_contract(mut self, meta: ContractMeta) -> Self {
        self.contract = Some(meta);
        self
    }

    pub fn with_dex(mut self, pairs: Vec<DexPair>) -> Self {
        self.dex = Some(pairs);
        self
    }

    pub fn with_holders(mut self, holders: Vec<Holder>) -> Self {
        self.holders = Some(holders);
        self
    }

    pub fn with_news(mut self, symbol: &str, posts: Vec<NewsPost>) -> Self {
        self.news = NewsFeed {
            symbol: Some(symbol.to_string()),
            posts,
        };
        self
    }

    pub fn with_closes(mut self, days: u32, closes: Vec<f64>) -> Self {
        self.closes.insert(days, closes);
        self
    }

    pub fn with_universe(mut self, universe: Vec<UniverseEntry>) -> Self {
        self.universe = universe;
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of provider calls answered so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Snapshot with the fields scoring reads; price fixed at 1.0.
pub fn snapshot(symbol: &str, volume_24h: f64, d1_pct: f64, d7_pct: f64) -> MarketSnapshot {
    MarketSnapshot {
        coin_id: symbol.to_lowercase(),
        symbol: symbol.to_uppercase(),
        price_usd: 1.0,
        market_cap: 0.0,
        volume_24h,
        d1_pct,
        d7_pct,
    }
}

pub fn post(positive: u32, negative: u32, important: u32) -> NewsPost {
    NewsPost {
        title: format!("+{positive} -{negative} !{important}"),
        url: None,
        published_at: None,
        votes: NewsVotes {
            positive,
            negative,
            important,
        },
    }
}

pub fn pair(liquidity_usd: f64, volume_24h: f64) -> DexPair {
    DexPair {
        liquidity_usd,
        volume_24h,
        dex_id: "uniswap".to_string(),
        chain_id: "ethereum".to_string(),
    }
}

#[async_trait]
impl SignalSource for FixtureSource {
    async fn market_snapshot(&self, token: &str) -> Option<MarketSnapshot> {
        self.answer().await;
        self.markets.get(&token.trim().to_uppercase()).cloned()
    }

    async fn contract_meta(&self, _address: &str) -> Option<ContractMeta> {
        self.answer().await;
        self.contract.clone()
    }

    async fn dex_pairs(&self, _address: &str) -> Option<Vec<DexPair>> {
        self.answer().await;
        self.dex.clone()
    }

    async fn top_holders(&self, _address: &str) -> Option<Vec<Holder>> {
        self.answer().await;
        self.holders.clone()
    }

    async fn news(&self, _token: &str) -> NewsFeed {
        self.answer().await;
        self.news.clone()
    }

    async fn daily_closes(&self, _token: &str, days: u32) -> Option<Vec<f64>> {
        self.answer().await;
        self.closes.get(&days).cloned()
    }

    async fn top_symbols(&self, limit: usize) -> Vec<UniverseEntry> {
        self.answer().await;
        self.universe.iter().take(limit).cloned().collect()
    }
}
