use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Dashboard configuration. Every field has a default, so a partial JSON
/// document (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directories (or URL paths) probed in order for every log file.
    pub base_paths: Vec<String>,

    /// Timeout of a regular log fetch.
    pub fetch_timeout_ms: u64,

    /// Timeouts of the existence checks the day navigator issues.
    pub capital_probe_timeout_ms: u64,
    pub strategy_probe_timeout_ms: u64,

    /// Timeout of the per-day chart reload after navigation.
    pub chart_load_timeout_ms: u64,

    /// How many calendar days the navigator walks before giving up.
    pub max_navigation_steps: u32,

    /// Reload period of the shared ticker.
    pub poll_interval_ms: u64,

    /// Rows per page of the trades table.
    pub page_size: usize,

    /// Rows per page of the order-book table.
    pub orderbook_page_size: usize,

    /// Multiplier applied to the relative equity curve when amplification is on.
    pub amplify_factor: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_paths: vec!["/logs".to_string(), "logs".to_string()],
            fetch_timeout_ms: 10_000,
            capital_probe_timeout_ms: 5_000,
            strategy_probe_timeout_ms: 3_000,
            chart_load_timeout_ms: 8_000,
            max_navigation_steps: 90,
            poll_interval_ms: 10_000,
            page_size: 5,
            orderbook_page_size: 5,
            amplify_factor: 1.8,
        }
    }
}

impl Settings {
    /// Parse and validate a JSON settings document.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.base_paths.is_empty() {
            return Err(CoreError::Config("base_paths must not be empty".into()));
        }
        let timeouts = [
            ("fetch_timeout_ms", self.fetch_timeout_ms),
            ("capital_probe_timeout_ms", self.capital_probe_timeout_ms),
            ("strategy_probe_timeout_ms", self.strategy_probe_timeout_ms),
            ("chart_load_timeout_ms", self.chart_load_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(CoreError::Config(format!("{name} must be greater than zero")));
            }
        }
        if self.page_size == 0 || self.orderbook_page_size == 0 {
            return Err(CoreError::Config("page sizes must be greater than zero".into()));
        }
        if !self.amplify_factor.is_finite() || self.amplify_factor <= 0.0 {
            return Err(CoreError::Config(format!(
                "amplify_factor must be a positive number, got {}",
                self.amplify_factor
            )));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn capital_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.capital_probe_timeout_ms)
    }

    pub fn strategy_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_probe_timeout_ms)
    }

    pub fn chart_load_timeout(&self) -> Duration {
        Duration::from_millis(self.chart_load_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
