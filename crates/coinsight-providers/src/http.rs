use std::sync::Arc;
use std::time::Duration;

use coinsight_cache::JsonCache;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ProviderError;

const MAX_ERROR_BODY: usize = 200;

/// Thin JSON-over-HTTP wrapper shared by all adapters.
#[derive(Clone)]
pub struct HttpJson {
    client: Client,
}

impl HttpJson {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET `url` with `query` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_on_char(body, MAX_ERROR_BODY),
            });
        }

        let text = response.text().await.map_err(|e| classify(url, e))?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Cut `body` to at most `max` bytes without splitting a character.
fn truncate_on_char(mut body: String, max: usize) -> String {
    if body.len() > max {
        let end = (0..=max).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        body.truncate(end);
    }
    body
}

fn classify(url: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            url: url.to_string(),
        }
    } else {
        ProviderError::Http(err)
    }
}

/// Best-effort response cache. A failing cache behaves like a miss.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<dyn JsonCache>,
}

impl ResponseCache {
    pub fn new(inner: Arc<dyn JsonCache>) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match coinsight_cache::get_typed(self.inner.as_ref(), key).await {
            Ok(hit) => {
                if hit.is_some() {
                    debug!(key, "Cache hit");
                }
                hit
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = coinsight_cache::set_typed(self.inner.as_ref(), key, value, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinsight_cache::MemoryCache;

    #[tokio::test]
    async fn response_cache_roundtrip() {
        let cache = ResponseCache::new(Arc::new(MemoryCache::new(10, Duration::from_secs(60))));
        cache
            .put("cg:hist:bitcoin:30", &vec![1.0, 2.0], Duration::from_secs(60))
            .await;
        let hit: Option<Vec<f64>> = cache.get("cg:hist:bitcoin:30").await;
        assert_eq!(hit, Some(vec![1.0, 2.0]));
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_miss() {
        let memory = Arc::new(MemoryCache::new(10, Duration::from_secs(60)));
        memory
            .insert("k".to_string(), "{oops".to_string(), Duration::from_secs(60))
            .await;
        let cache = ResponseCache::new(memory);
        let hit: Option<Vec<f64>> = cache.get("k").await;
        assert!(hit.is_none());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = format!("{}é rest", "a".repeat(199));
        let cut = truncate_on_char(body, MAX_ERROR_BODY);
        assert_eq!(cut.len(), 199);
        assert!(cut.chars().all(|c| c == 'a'));

        assert_eq!(truncate_on_char("short".to_string(), MAX_ERROR_BODY), "short");
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn multibyte_error_body_is_a_status_error() {
        let body = format!("{}é rest of the error page", "a".repeat(199));
        let url = serve_once("503 Service Unavailable", body).await;

        let http = HttpJson::new(Duration::from_secs(5));
        let err = http.get::<serde_json::Value>(&url, &[]).await.unwrap_err();
        match err {
            ProviderError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "a".repeat(199));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
