use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::LogSource;
use crate::errors::CoreError;

/// Serves logs over HTTP from a static file host.
///
/// - Every request disables caching (`Cache-Control: no-store`) and appends a
///   `_=<epoch ms>` cache-busting parameter.
/// - Every request carries its own timeout, on native and wasm32 alike.
/// - Paths are resolved against `origin`; absolute `http(s)://` paths are used
///   as-is.
pub struct HttpLogSource {
    client: Client,
    origin: String,
}

impl HttpLogSource {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: Client::builder().build().unwrap_or_else(|_| Client::new()),
            origin: origin.into(),
        }
    }

    /// Full URL (without the cache-busting parameter) for a fetcher path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let origin = self.origin.trim_end_matches('/');
        format!("{origin}/{}", path.trim_start_matches('/'))
    }

    fn request(&self, url: &str, timeout: Duration) -> RequestBuilder {
        let stamp = chrono::Utc::now().timestamp_millis();
        self.client
            .get(cache_busted(url, stamp))
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .timeout(timeout)
    }
}

/// Append `_=<stamp>` using `?` or `&` depending on whether `url` already has a query.
pub fn cache_busted(url: &str, stamp_ms: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}_={stamp_ms}")
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl LogSource for HttpLogSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_json(&self, path: &str, timeout: Duration) -> Result<Value, CoreError> {
        let url = self.url_for(path);
        let resp = self.request(&url, timeout).send().await?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "log fetch miss");
            return Err(CoreError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| CoreError::Deserialization(format!("Failed to parse {url}: {e}")))
    }

    async fn probe(&self, path: &str, timeout: Duration) -> Result<(), CoreError> {
        let url = self.url_for(path);
        let resp = self.request(&url, timeout).send().await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CoreError::HttpStatus {
                url,
                status: status.as_u16(),
            })
        }
    }
}
