//! CoinGecko: coin id resolution, market snapshots, daily closes and the
//! market-cap ranked universe.

use std::collections::HashMap;
use std::time::Duration;

use coinsight_models::cache_schema::key_patterns;
use coinsight_models::{is_address, CoinRef, MarketSnapshot, UniverseEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{HttpJson, ResponseCache};

/// CoinGecko caps `per_page` at 250.
const MAX_PAGE_SIZE: usize = 250;

/// One row of `/coins/list?include_platform=true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinListEntry {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    /// Chain name to contract address. Values can be null or empty.
    #[serde(default)]
    pub platforms: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct MarketRow {
    #[serde(default)]
    symbol: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy)]
pub struct CoinGeckoTtls {
    pub coin_list: Duration,
    pub market: Duration,
    pub closes: Duration,
}

pub struct CoinGeckoClient {
    http: HttpJson,
    cache: ResponseCache,
    base: String,
    ttls: CoinGeckoTtls,
}

/// Resolve a symbol, name or contract address against the coin list.
///
/// Addresses match any platform address (case-insensitive). Otherwise an
/// exact symbol match wins, preferring the shortest id among duplicates,
/// then an exact name match.
pub fn resolve_coin(list: &[CoinListEntry], input: &str) -> Option<CoinRef> {
    let input = input.trim();
    let lower = input.to_lowercase();
    let to_ref = |c: &CoinListEntry| CoinRef {
        id: c.id.clone(),
        symbol: c.symbol.to_uppercase(),
    };

    if is_address(input) {
        return list
            .iter()
            .find(|c| {
                c.platforms
                    .values()
                    .flatten()
                    .any(|addr| !addr.is_empty() && addr.to_lowercase() == lower)
            })
            .map(to_ref);
    }

    let by_symbol = list
        .iter()
        .filter(|c| !c.symbol.is_empty() && c.symbol.to_lowercase() == lower)
        .min_by_key(|c| c.id.len());
    if let Some(coin) = by_symbol {
        return Some(to_ref(coin));
    }

    list.iter()
        .find(|c| !c.name.is_empty() && c.name.to_lowercase() == lower)
        .map(to_ref)
}

fn to_decimal(price: Option<f64>) -> Decimal {
    price
        .and_then(|p| Decimal::try_from(p).ok())
        .unwrap_or_default()
}

impl CoinGeckoClient {
    pub fn new(http: HttpJson, cache: ResponseCache, base: &str, ttls: CoinGeckoTtls) -> Self {
        Self {
            http,
            cache,
            base: base.trim_end_matches('/').to_string(),
            ttls,
        }
    }

    pub async fn coin_list(&self) -> Result<Vec<CoinListEntry>, ProviderError> {
        if let Some(list) = self
            .cache
            .get::<Vec<CoinListEntry>>(key_patterns::COIN_LIST)
            .await
        {
            if !list.is_empty() {
                return Ok(list);
            }
        }

        let url = format!("{}/coins/list", self.base);
        let list: Vec<CoinListEntry> = self
            .http
            .get(&url, &[("include_platform", "true")])
            .await?;
        if !list.is_empty() {
            self.cache
                .put(key_patterns::COIN_LIST, &list, self.ttls.coin_list)
                .await;
        }
        Ok(list)
    }

    pub async fn resolve(&self, input: &str) -> Result<Option<CoinRef>, ProviderError> {
        let list = self.coin_list().await?;
        Ok(resolve_coin(&list, input))
    }

    /// Market snapshot for an already resolved coin.
    pub async fn market(&self, coin: &CoinRef) -> Result<Option<MarketSnapshot>, ProviderError> {
        let key = key_patterns::market(&coin.id);
        if let Some(snapshot) = self.cache.get::<MarketSnapshot>(&key).await {
            return Ok(Some(snapshot));
        }

        let url = format!("{}/coins/markets", self.base);
        let rows: Vec<MarketRow> = self
            .http
            .get(
                &url,
                &[
                    ("vs_currency", "usd"),
                    ("ids", coin.id.as_str()),
                    ("price_change_percentage", "24h,7d"),
                ],
            )
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let snapshot = MarketSnapshot {
            coin_id: coin.id.clone(),
            symbol: coin.symbol.to_uppercase(),
            price_usd: row.current_price.unwrap_or(0.0),
            market_cap: row.market_cap.unwrap_or(0.0),
            volume_24h: row.total_volume.unwrap_or(0.0),
            d1_pct: row.price_change_percentage_24h.unwrap_or(0.0),
            d7_pct: row.price_change_percentage_7d_in_currency.unwrap_or(0.0),
        };
        self.cache.put(&key, &snapshot, self.ttls.market).await;
        Ok(Some(snapshot))
    }

    /// Daily USD closes, oldest first. `None` when the chart is empty.
    pub async fn daily_closes(
        &self,
        coin: &CoinRef,
        days: u32,
    ) -> Result<Option<Vec<f64>>, ProviderError> {
        let key = key_patterns::closes(&coin.id, days);
        if let Some(closes) = self.cache.get::<Vec<f64>>(&key).await {
            if !closes.is_empty() {
                return Ok(Some(closes));
            }
        }

        let url = format!("{}/coins/{}/market_chart", self.base, coin.id);
        let days_param = days.to_string();
        let chart: MarketChart = self
            .http
            .get(
                &url,
                &[
                    ("vs_currency", "usd"),
                    ("days", days_param.as_str()),
                    ("interval", "daily"),
                ],
            )
            .await?;

        let closes: Vec<f64> = chart
            .prices
            .into_iter()
            .map(|(_, price)| price)
            .filter(|p| p.is_finite())
            .collect();
        if closes.is_empty() {
            return Ok(None);
        }
        self.cache.put(&key, &closes, self.ttls.closes).await;
        Ok(Some(closes))
    }

    /// Top `limit` coins by market cap with their current USD price.
    pub async fn top_symbols(&self, limit: usize) -> Result<Vec<UniverseEntry>, ProviderError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let url = format!("{}/coins/markets", self.base);
        let per_page = limit.min(MAX_PAGE_SIZE).to_string();
        let rows: Vec<MarketRow> = self
            .http
            .get(
                &url,
                &[
                    ("vs_currency", "usd"),
                    ("order", "market_cap_desc"),
                    ("per_page", per_page.as_str()),
                    ("page", "1"),
                    ("price_change_percentage", "24h"),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter(|r| !r.symbol.is_empty())
            .take(limit)
            .map(|r| UniverseEntry {
                symbol: r.symbol.to_uppercase(),
                price_usd: to_decimal(r.current_price),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, symbol: &str, name: &str, platforms: &[(&str, &str)]) -> CoinListEntry {
        CoinListEntry {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            platforms: platforms
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        }
    }

    fn list() -> Vec<CoinListEntry> {
        vec![
            entry("ethereum-wormhole", "eth", "Ethereum (Wormhole)", &[]),
            entry("ethereum", "eth", "Ethereum", &[]),
            entry(
                "usd-coin",
                "usdc",
                "USDC",
                &[("ethereum", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")],
            ),
            entry("solana", "sol", "Solana", &[]),
        ]
    }

    #[test]
    fn symbol_prefers_shortest_id() {
        let coin = resolve_coin(&list(), "ETH").unwrap();
        assert_eq!(coin.id, "ethereum");
        assert_eq!(coin.symbol, "ETH");
    }

    #[test]
    fn address_matches_platform_case_insensitively() {
        let coin = resolve_coin(&list(), "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        assert_eq!(coin.id, "usd-coin");
        assert_eq!(coin.symbol, "USDC");
    }

    #[test]
    fn unknown_address_does_not_fall_back_to_name() {
        assert!(resolve_coin(&list(), "0xdeadbeefdeadbeef").is_none());
    }

    #[test]
    fn name_match_is_last_resort() {
        let coin = resolve_coin(&list(), "solana").unwrap();
        assert_eq!(coin.id, "solana");
        assert!(resolve_coin(&list(), "nothing").is_none());
    }

    #[test]
    fn coin_list_tolerates_null_platform_addresses() {
        let json = r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin","platforms":{"":null}}]"#;
        let list: Vec<CoinListEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(resolve_coin(&list, "btc").unwrap().id, "bitcoin");
    }

    #[test]
    fn market_chart_parses_price_pairs() {
        let chart: MarketChart =
            serde_json::from_str(r#"{"prices":[[1700000000000,100.5],[1700086400000,101.0]]}"#)
                .unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[1].1, 101.0);
    }

    #[test]
    fn missing_price_becomes_zero() {
        assert_eq!(to_decimal(None), Decimal::ZERO);
        assert_eq!(to_decimal(Some(f64::NAN)), Decimal::ZERO);
    }
}
