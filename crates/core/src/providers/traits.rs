use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::errors::CoreError;

/// Trait abstraction for wherever the daily JSON logs live.
///
/// Paths are the `base/file` strings built by the fetcher (e.g.
/// `/logs/capital_log_2025-01-01.json`); each implementation decides how to
/// resolve them. Every call is bounded by its own timeout.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LogSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch and parse one JSON document.
    /// Any non-success answer is an error; the fetcher treats it as a miss.
    async fn fetch_json(&self, path: &str, timeout: Duration) -> Result<Value, CoreError>;

    /// Lightweight existence check; `Ok(())` means the document is there.
    async fn probe(&self, path: &str, timeout: Duration) -> Result<(), CoreError>;
}
