use std::time::Duration;

use coinsight_models::cache_schema::key_patterns;
use coinsight_models::{NewsFeed, NewsPost, NewsVotes};
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::{HttpJson, ResponseCache};

pub const MAX_POSTS: usize = 20;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    title: String,
    url: Option<String>,
    published_at: Option<String>,
    votes: Option<NewsVotes>,
}

/// Recent news posts with community votes, per currency code.
pub struct CryptoPanicClient {
    http: HttpJson,
    cache: ResponseCache,
    base: String,
    key: Option<String>,
    ttl: Duration,
}

impl CryptoPanicClient {
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
            base: base.trim_end_matches('/').to_string(),
            key,
            ttl,
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub async fn news(&self, symbol: &str) -> Result<NewsFeed, ProviderError> {
        let key = self
            .key
            .as_deref()
            .ok_or(ProviderError::MissingKey("CRYPTOPANIC_KEY"))?;

        let cache_key = key_patterns::news(symbol);
        if let Some(feed) = self.cache.get::<NewsFeed>(&cache_key).await {
            return Ok(feed);
        }

        let url = format!("{}/posts/", self.base);
        let body: Response = self
            .http
            .get(
                &url,
                &[("auth_token", key), ("currencies", symbol), ("kind", "news")],
            )
            .await?;

        let feed = NewsFeed {
            symbol: Some(symbol.to_string()),
            posts: parse_posts(body),
        };
        self.cache.put(&cache_key, &feed, self.ttl).await;
        Ok(feed)
    }
}

fn parse_posts(body: Response) -> Vec<NewsPost> {
    body.results
        .into_iter()
        .take(MAX_POSTS)
        .map(|p| NewsPost {
            title: p.title,
            url: p.url,
            published_at: p.published_at,
            votes: p.votes.unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_posts_and_defaults_votes() {
        let posts: Vec<serde_json::Value> = (0..25)
            .map(|i| serde_json::json!({"title": format!("post {i}"), "votes": {"positive": 1}}))
            .collect();
        let mut body = serde_json::json!({ "results": posts });
        body["results"][0]["votes"] = serde_json::Value::Null;

        let parsed = parse_posts(serde_json::from_value(body).unwrap());
        assert_eq!(parsed.len(), MAX_POSTS);
        assert_eq!(parsed[0].votes, NewsVotes::default());
        assert_eq!(parsed[1].votes.positive, 1);
    }
}
