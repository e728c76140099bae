use chrono::{Days, NaiveDate};
use std::time::Duration;
use tracing::{debug, info};

use crate::models::log_file::LogKind;
use crate::models::settings::Settings;
use crate::services::fetch_service::LogFetcher;

/// Finds the nearest calendar day that has both a capital log and a strategy
/// results file, walking one day at a time in a fixed direction.
///
/// The walk is bounded (90 days by default) and a forward walk stops at
/// `today`: dates in the future are never returned.
pub struct DayNavigator {
    fetcher: LogFetcher,
    max_steps: u32,
    capital_probe_timeout: Duration,
    strategy_probe_timeout: Duration,
}

impl DayNavigator {
    pub fn new(fetcher: LogFetcher, settings: &Settings) -> Self {
        Self {
            fetcher,
            max_steps: settings.max_navigation_steps,
            capital_probe_timeout: settings.capital_probe_timeout(),
            strategy_probe_timeout: settings.strategy_probe_timeout(),
        }
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Nearest day strictly after (`step > 0`) or before (`step < 0`) `start`
    /// with both logs present. `None` when `step` is zero, the bound is
    /// exhausted, or a forward walk would pass `today`.
    pub async fn find_nearest_day(&self, start: NaiveDate, step: i32, today: NaiveDate) -> Option<NaiveDate> {
        if step == 0 {
            return None;
        }

        let mut current = start;
        for _ in 0..self.max_steps {
            current = shift(current, step)?;
            if step > 0 && current > today {
                debug!(%current, %today, "forward walk reached today");
                return None;
            }
            if self.has_day(current).await {
                info!(%start, found = %current, "nearest day with logs");
                return Some(current);
            }
        }

        info!(%start, step, max_steps = self.max_steps, "no day with logs in range");
        None
    }

    /// Both required files exist for `date` (capital first; strategy only
    /// probed when capital is there).
    pub async fn has_day(&self, date: NaiveDate) -> bool {
        self.fetcher
            .exists(&LogKind::Capital.file_name(date), self.capital_probe_timeout)
            .await
            && self
                .fetcher
                .exists(&LogKind::Strategy.file_name(date), self.strategy_probe_timeout)
                .await
    }
}

/// `date` moved by `days` calendar days (negative moves back).
pub fn shift(date: NaiveDate, days: i32) -> Option<NaiveDate> {
    let magnitude = Days::new(u64::from(days.unsigned_abs()));
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}
