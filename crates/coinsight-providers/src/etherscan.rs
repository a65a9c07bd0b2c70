use std::time::Duration;

use coinsight_models::cache_schema::key_patterns;
use coinsight_models::ContractMeta;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::{HttpJson, ResponseCache};

const UNVERIFIED_MARKER: &str = "Contract source code not verified";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    /// An array on success, an error string otherwise.
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SourceCodeRow {
    source_code: String,
    contract_name: String,
    compiler_version: String,
    license_type: String,
    proxy: String,
    implementation: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl From<SourceCodeRow> for ContractMeta {
    fn from(row: SourceCodeRow) -> Self {
        ContractMeta {
            verified: !row.source_code.is_empty() && row.source_code != UNVERIFIED_MARKER,
            proxy: row.proxy == "1",
            contract_name: non_empty(row.contract_name),
            implementation: non_empty(row.implementation),
            compiler_version: non_empty(row.compiler_version),
            license_type: non_empty(row.license_type),
        }
    }
}

/// Contract source verification lookups (`module=contract&action=getsourcecode`).
pub struct EtherscanClient {
    http: HttpJson,
    cache: ResponseCache,
    base: String,
    key: Option<String>,
    ttl: Duration,
}

impl EtherscanClient {
    pub fn new(
        http: HttpJson,
        cache: ResponseCache,
        base: &str,
        key: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            base: base.to_string(),
            key,
            ttl,
        }
    }

    pub async fn contract_meta(&self, address: &str) -> Result<Option<ContractMeta>, ProviderError> {
        let key = self
            .key
            .as_deref()
            .ok_or(ProviderError::MissingKey("ETHERSCAN_KEY"))?;

        let cache_key = key_patterns::contract(address);
        if let Some(meta) = self.cache.get::<ContractMeta>(&cache_key).await {
            return Ok(Some(meta));
        }

        let envelope: Envelope = self
            .http
            .get(
                &self.base,
                &[
                    ("module", "contract"),
                    ("action", "getsourcecode"),
                    ("address", address),
                    ("apikey", key),
                ],
            )
            .await?;

        let Some(meta) = parse_envelope(envelope) else {
            return Ok(None);
        };
        self.cache.put(&cache_key, &meta, self.ttl).await;
        Ok(Some(meta))
    }
}

fn parse_envelope(envelope: Envelope) -> Option<ContractMeta> {
    if envelope.status != "1" {
        return None;
    }
    let rows: Vec<SourceCodeRow> = serde_json::from_value(envelope.result).ok()?;
    rows.into_iter().next().map(ContractMeta::from)
}
