use coinsight_models::Holder;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::HttpJson;

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    items: Option<Vec<RawHolder>>,
}

#[derive(Debug, Deserialize)]
struct RawHolder {
    #[serde(default)]
    address: String,
    balance_quote: Option<f64>,
}

/// Top token holders with a USD balance estimate.
pub struct CovalentClient {
    http: HttpJson,
    base: String,
    key: Option<String>,
    chain_id: u32,
    limit: u32,
}

impl CovalentClient {
    pub fn new(http: HttpJson, base: &str, key: Option<String>, chain_id: u32, limit: u32) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            key,
            chain_id,
            limit,
        }
    }

    pub async fn top_holders(&self, address: &str) -> Result<Option<Vec<Holder>>, ProviderError> {
        let key = self
            .key
            .as_deref()
            .ok_or(ProviderError::MissingKey("COVALENT_API_KEY"))?;

        let url = format!(
            "{}/{}/tokens/{}/token_holders/",
            self.base, self.chain_id, address
        );
        let limit = self.limit.to_string();
        let body: Response = self
            .http
            .get(&url, &[("page-size", limit.as_str()), ("key", key)])
            .await?;
        Ok(parse_holders(body))
    }
}

fn parse_holders(body: Response) -> Option<Vec<Holder>> {
    let items = body.data?.items?;
    Some(
        items
            .into_iter()
            .map(|h| Holder {
                address: h.address,
                balance_usd: h.balance_quote.unwrap_or(0.0),
            })
            .collect(),
    )
}
