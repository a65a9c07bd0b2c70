use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coinsight_cache::JsonCache;
use coinsight_models::{
    is_address, CacheConfig, ContractMeta, DexPair, Holder, MarketSnapshot, NewsFeed,
    ProvidersConfig, UniverseEntry,
};
use tracing::{debug, warn};

use crate::coingecko::{CoinGeckoClient, CoinGeckoTtls};
use crate::covalent::CovalentClient;
use crate::cryptopanic::CryptoPanicClient;
use crate::dexscreener::DexScreenerClient;
use crate::error::ProviderError;
use crate::etherscan::EtherscanClient;
use crate::http::{HttpJson, ResponseCache};
use crate::SignalSource;

/// Live providers over HTTP, sharing one client and one response cache.
pub struct HttpSignalSource {
    coingecko: CoinGeckoClient,
    etherscan: EtherscanClient,
    dexscreener: DexScreenerClient,
    covalent: CovalentClient,
    cryptopanic: CryptoPanicClient,
}

impl HttpSignalSource {
    pub fn new(providers: &ProvidersConfig, ttls: &CacheConfig, cache: Arc<dyn JsonCache>) -> Self {
        let http = HttpJson::new(Duration::from_millis(providers.request_timeout_ms));
        let cache = ResponseCache::new(cache);
        let secs = Duration::from_secs;

        Self {
            coingecko: CoinGeckoClient::new(
                http.clone(),
                cache.clone(),
                &providers.coingecko_base,
                CoinGeckoTtls {
                    coin_list: secs(ttls.coin_list_ttl_seconds),
                    market: secs(ttls.market_ttl_seconds),
                    closes: secs(ttls.closes_ttl_seconds),
                },
            ),
            etherscan: EtherscanClient::new(
                http.clone(),
                cache.clone(),
                &providers.etherscan_base,
                providers.etherscan_key.clone(),
                secs(ttls.contract_ttl_seconds),
            ),
            dexscreener: DexScreenerClient::new(
                http.clone(),
                cache.clone(),
                &providers.dexscreener_base,
                secs(ttls.dex_ttl_seconds),
            ),
            covalent: CovalentClient::new(
                http.clone(),
                &providers.covalent_base,
                providers.covalent_key.clone(),
                providers.chain_id,
                providers.holders_limit,
            ),
            cryptopanic: CryptoPanicClient::new(
                http,
                cache,
                &providers.cryptopanic_base,
                providers.cryptopanic_key.clone(),
                secs(ttls.news_ttl_seconds),
            ),
        }
    }

    async fn news_symbol(&self, token: &str) -> Option<String> {
        if !is_address(token) {
            return Some(token.to_uppercase());
        }
        degrade("coingecko", token, self.coingecko.resolve(token).await)
            .flatten()
            .map(|coin| coin.symbol)
    }
}

/// Convert an adapter failure into the "no data" sentinel.
fn degrade<T>(provider: &'static str, token: &str, result: Result<T, ProviderError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_missing_key() => {
            debug!(provider, token, error = %e, "Provider disabled");
            None
        }
        Err(e) => {
            warn!(provider, token, error = %e, "Provider unavailable, reporting no data");
            None
        }
    }
}

#[async_trait]
impl SignalSource for HttpSignalSource {
    async fn market_snapshot(&self, token: &str) -> Option<MarketSnapshot> {
        let coin = degrade("coingecko", token, self.coingecko.resolve(token).await).flatten()?;
        degrade("coingecko", token, self.coingecko.market(&coin).await).flatten()
    }

    async fn contract_meta(&self, address: &str) -> Option<ContractMeta> {
        degrade("etherscan", address, self.etherscan.contract_meta(address).await).flatten()
    }

    async fn dex_pairs(&self, address: &str) -> Option<Vec<DexPair>> {
        degrade("dexscreener", address, self.dexscreener.pairs(address).await)
    }

    async fn top_holders(&self, address: &str) -> Option<Vec<Holder>> {
        degrade("covalent", address, self.covalent.top_holders(address).await).flatten()
    }

    async fn news(&self, token: &str) -> NewsFeed {
        if !self.cryptopanic.has_key() {
            let symbol = (!is_address(token)).then(|| token.to_uppercase());
            return NewsFeed {
                symbol,
                posts: Vec::new(),
            };
        }

        let Some(symbol) = self.news_symbol(token).await else {
            return NewsFeed::default();
        };
        degrade("cryptopanic", token, self.cryptopanic.news(&symbol).await).unwrap_or(NewsFeed {
            symbol: Some(symbol),
            posts: Vec::new(),
        })
    }

    async fn daily_closes(&self, token: &str, days: u32) -> Option<Vec<f64>> {
        let coin = degrade("coingecko", token, self.coingecko.resolve(token).await).flatten()?;
        degrade(
            "coingecko",
            token,
            self.coingecko.daily_closes(&coin, days).await,
        )
        .flatten()
    }

    async fn top_symbols(&self, limit: usize) -> Vec<UniverseEntry> {
        degrade("coingecko", "universe", self.coingecko.top_symbols(limit).await)
            .unwrap_or_default()
    }
}
