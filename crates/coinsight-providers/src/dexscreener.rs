use std::time::Duration;

use coinsight_models::cache_schema::key_patterns;
use coinsight_models::DexPair;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::{HttpJson, ResponseCache};

#[derive(Debug, Deserialize)]
struct TokenPairs {
    #[serde(default)]
    pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPair {
    #[serde(default)]
    chain_id: String,
    #[serde(default)]
    dex_id: String,
    liquidity: Option<Amount>,
    volume: Option<Volume>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    h24: Option<f64>,
}

impl From<RawPair> for DexPair {
    fn from(raw: RawPair) -> Self {
        DexPair {
            liquidity_usd: raw.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
            volume_24h: raw.volume.and_then(|v| v.h24).unwrap_or(0.0),
            dex_id: raw.dex_id,
            chain_id: raw.chain_id,
        }
    }
}

/// DEX pairs for a token address (`/tokens/{address}`).
pub struct DexScreenerClient {
    http: HttpJson,
    cache: ResponseCache,
    base: String,
    ttl: Duration,
}

impl DexScreenerClient {
    pub fn new(http: HttpJson, cache: ResponseCache, base: &str, ttl: Duration) -> Self {
        Self {
            http,
            cache,
            base: base.trim_end_matches('/').to_string(),
            ttl,
        }
    }

    /// A successful answer with `pairs: null` means the token has no pools
    /// and yields an empty list.
    pub async fn pairs(&self, address: &str) -> Result<Vec<DexPair>, ProviderError> {
        let key = key_patterns::dex_pairs(address);
        if let Some(pairs) = self.cache.get::<Vec<DexPair>>(&key).await {
            return Ok(pairs);
        }

        let url = format!("{}/tokens/{}", self.base, address);
        let body: TokenPairs = self.http.get(&url, &[]).await?;
        let pairs = parse_pairs(body);
        self.cache.put(&key, &pairs, self.ttl).await;
        Ok(pairs)
    }
}

fn parse_pairs(body: TokenPairs) -> Vec<DexPair> {
    body.pairs
        .unwrap_or_default()
        .into_iter()
        .map(DexPair::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_liquidity_and_volume() {
        let body: TokenPairs = serde_json::from_str(
            r#"{"schemaVersion":"1.0.0","pairs":[
                {"chainId":"ethereum","dexId":"uniswap","liquidity":{"usd":1250000.5},"volume":{"h24":340000}},
                {"chainId":"ethereum","dexId":"sushiswap","volume":{"h24":10}}
            ]}"#,
        )
        .unwrap();
        let pairs = parse_pairs(body);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].dex_id, "uniswap");
        assert_eq!(pairs[0].liquidity_usd, 1_250_000.5);
        assert_eq!(pairs[1].liquidity_usd, 0.0);
    }

    #[test]
    fn null_pairs_is_empty() {
        let body: TokenPairs = serde_json::from_str(r#"{"pairs":null}"#).unwrap();
        assert!(parse_pairs(body).is_empty());
        let body: TokenPairs = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parse_pairs(body).is_empty());
    }
}
