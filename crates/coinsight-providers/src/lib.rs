pub mod coingecko;
pub mod covalent;
pub mod cryptopanic;
pub mod dexscreener;
pub mod error;
pub mod etherscan;
pub mod http;
pub mod source;

pub mod test_support;

use async_trait::async_trait;
use coinsight_models::{ContractMeta, DexPair, Holder, MarketSnapshot, NewsFeed, UniverseEntry};

pub use error::ProviderError;
pub use source::HttpSignalSource;

/// External signals consumed by scoring, agents and the backtest.
///
/// Implementations never fail: an unavailable provider reports `None`
/// (or an empty feed / universe) and logs why.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn market_snapshot(&self, token: &str) -> Option<MarketSnapshot>;

    async fn contract_meta(&self, address: &str) -> Option<ContractMeta>;

    /// `Some(vec![])` means the provider answered and found no pools.
    async fn dex_pairs(&self, address: &str) -> Option<Vec<DexPair>>;

    async fn top_holders(&self, address: &str) -> Option<Vec<Holder>>;

    async fn news(&self, token: &str) -> NewsFeed;

    /// Daily USD closes, oldest first.
    async fn daily_closes(&self, token: &str, days: u32) -> Option<Vec<f64>>;

    /// Ranked by market cap, descending.
    async fn top_symbols(&self, limit: usize) -> Vec<UniverseEntry>;
}

/// A source with no providers configured. Every lookup reports no data.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineSource;

#[async_trait]
impl SignalSource for OfflineSource {
    async fn market_snapshot(&self, _token: &str) -> Option<MarketSnapshot> {
        None
    }

    async fn contract_meta(&self, _address: &str) -> Option<ContractMeta> {
        None
    }

    async fn dex_pairs(&self, _address: &str) -> Option<Vec<DexPair>> {
        None
    }

    async fn top_holders(&self, _address: &str) -> Option<Vec<Holder>> {
        None
    }

    async fn news(&self, _token: &str) -> NewsFeed {
        NewsFeed::default()
    }

    async fn daily_closes(&self, _token: &str, _days: u32) -> Option<Vec<f64>> {
        None
    }

    async fn top_symbols(&self, _limit: usize) -> Vec<UniverseEntry> {
        Vec::new()
    }
}
