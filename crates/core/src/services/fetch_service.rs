use chrono::{Days, NaiveDate};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::log_file::{DaySource, LogKind};
use crate::models::settings::Settings;
use crate::providers::join_path;
use crate::providers::traits::LogSource;

/// A document served by the first candidate that answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub data: Value,
    /// The `base/file` path that answered.
    pub path: String,
}

/// A document served by a today/yesterday fallback fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFetched {
    pub data: Value,
    pub path: String,
    pub source: DaySource,
}

/// Fetches dated JSON logs from a [`LogSource`] across several base paths.
///
/// Lookup order for a list of file names is name-major: every base is tried
/// for the first name before the second name is considered. A failed
/// candidate is a soft miss; only when all candidates miss does the fetch
/// fail with [`CoreError::LoadFailed`].
#[derive(Clone)]
pub struct LogFetcher {
    source: Arc<dyn LogSource>,
    base_paths: Vec<String>,
    timeout: Duration,
}

impl LogFetcher {
    pub fn new(source: Arc<dyn LogSource>, settings: &Settings) -> Self {
        Self::with_bases(source, settings.base_paths.clone(), settings.fetch_timeout())
    }

    pub fn with_bases(source: Arc<dyn LogSource>, base_paths: Vec<String>, timeout: Duration) -> Self {
        Self {
            source,
            base_paths,
            timeout,
        }
    }

    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Every `base/name` combination in lookup order.
    pub fn candidates(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .flat_map(|name| self.base_paths.iter().map(move |base| join_path(base, name)))
            .collect()
    }

    /// Return the first candidate that serves valid JSON, using the default timeout.
    pub async fn fetch_first(&self, names: &[String]) -> Result<Fetched, CoreError> {
        self.fetch_first_within(names, self.timeout).await
    }

    /// Like [`fetch_first`](Self::fetch_first) with an explicit per-request timeout.
    pub async fn fetch_first_within(
        &self,
        names: &[String],
        timeout: Duration,
    ) -> Result<Fetched, CoreError> {
        for path in self.candidates(names) {
            match self.source.fetch_json(&path, timeout).await {
                Ok(data) => {
                    debug!(source = self.source.name(), %path, "log fetched");
                    return Ok(Fetched { data, path });
                }
                Err(e) if e.is_soft_miss() => {
                    debug!(source = self.source.name(), %path, error = %e, "log candidate missed");
                }
                Err(e) => {
                    warn!(source = self.source.name(), %path, error = %e, "log lookup aborted");
                    return Err(e);
                }
            }
        }

        Err(CoreError::LoadFailed {
            file: names.join(" | "),
        })
    }

    /// Try every base/today combination, then every base/yesterday combination.
    pub async fn fetch_with_fallback(
        &self,
        today: &[String],
        yesterday: &[String],
    ) -> Result<DailyFetched, CoreError> {
        self.fetch_with_fallback_within(today, yesterday, self.timeout).await
    }

    pub async fn fetch_with_fallback_within(
        &self,
        today: &[String],
        yesterday: &[String],
        timeout: Duration,
    ) -> Result<DailyFetched, CoreError> {
        match self.fetch_first_within(today, timeout).await {
            Ok(hit) => {
                return Ok(DailyFetched {
                    data: hit.data,
                    path: hit.path,
                    source: DaySource::Today,
                })
            }
            Err(CoreError::LoadFailed { .. }) => {}
            Err(e) => return Err(e),
        }

        match self.fetch_first_within(yesterday, timeout).await {
            Ok(hit) => {
                info!(path = %hit.path, "today's log missing, using yesterday's");
                Ok(DailyFetched {
                    data: hit.data,
                    path: hit.path,
                    source: DaySource::Yesterday,
                })
            }
            Err(CoreError::LoadFailed { .. }) => Err(CoreError::LoadFailed {
                file: today.join(" | "),
            }),
            Err(e) => Err(e),
        }
    }

    /// Fetch one log family for `date`, falling back to the previous calendar day.
    pub async fn fetch_daily(&self, kind: LogKind, date: NaiveDate) -> Result<DailyFetched, CoreError> {
        let today = vec![kind.file_name(date)];
        let yesterday = previous_day(date)
            .map(|d| vec![kind.file_name(d)])
            .unwrap_or_default();
        self.fetch_with_fallback(&today, &yesterday).await
    }

    /// Fetch one log family for exactly `date` (no fallback).
    pub async fn fetch_for_date(
        &self,
        kind: LogKind,
        date: NaiveDate,
        timeout: Duration,
    ) -> Result<Fetched, CoreError> {
        self.fetch_first_within(&[kind.file_name(date)], timeout).await
    }

    /// `true` if any base serves `name` within `timeout`.
    pub async fn exists(&self, name: &str, timeout: Duration) -> bool {
        for path in self.candidates(&[name.to_string()]) {
            match self.source.probe(&path, timeout).await {
                Ok(()) => return true,
                Err(e) => debug!(%path, error = %e, "probe missed"),
            }
        }
        false
    }
}

/// The calendar day before `date` (`None` only at the start of chrono's range).
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}
