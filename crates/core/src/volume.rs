//! Order-book volume viewer: buy/sell volume per interval for one day.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::log_file::{DaySource, LogKind};
use crate::models::orderbook::{OrderbookPage, OrderbookRow, OrderbookStats};
use crate::models::settings::Settings;
use crate::providers::traits::LogSource;
use crate::services::fetch_service::{previous_day, LogFetcher};
use crate::services::navigator_service::shift;
use crate::services::normalize_service::NormalizeService;
use crate::services::orderbook_service::OrderbookService;
use crate::LoadOutcome;

#[derive(Debug, Default)]
struct VolumeState {
    rows: Vec<OrderbookRow>,
    target_date: Option<NaiveDate>,
    /// Set once the user picked a day; polling then reloads that day
    /// instead of today.
    pinned: bool,
    /// Zero-based page currently shown.
    page: usize,
}

#[must_use]
pub struct VolumeViewer {
    fetcher: LogFetcher,
    normalize: NormalizeService,
    orderbook: OrderbookService,
    page_size: usize,
    state: RwLock<VolumeState>,
    generation: AtomicU64,
}

impl VolumeViewer {
    pub fn new(source: Arc<dyn LogSource>, settings: &Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            fetcher: LogFetcher::new(source, settings),
            normalize: NormalizeService::new(),
            orderbook: OrderbookService::new(),
            page_size: settings.orderbook_page_size,
            state: RwLock::new(VolumeState::default()),
            generation: AtomicU64::new(0),
        })
    }

    /// Load `date`'s order book (30-minute file first), falling back to the
    /// previous day. When the fallback served the data the target date moves
    /// to that day. Resets paging to the newest page.
    pub async fn load_for_date(&self, date: NaiveDate) -> Result<LoadOutcome, CoreError> {
        self.load(date, true).await
    }

    /// Reload the pinned day, or `today` while following live data.
    pub async fn autoload(&self, today: NaiveDate) -> Result<LoadOutcome, CoreError> {
        let pinned = {
            let state = self.state.read().await;
            state.target_date.filter(|_| state.pinned)
        };
        match pinned {
            Some(date) => self.load(date, true).await,
            None => self.load(today, false).await,
        }
    }

    async fn load(&self, date: NaiveDate, pin: bool) -> Result<LoadOutcome, CoreError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let yesterday = previous_day(date);
        let fallback_names = yesterday.map(LogKind::orderbook_names).unwrap_or_default();
        let fetched = self
            .fetcher
            .fetch_with_fallback(&LogKind::orderbook_names(date), &fallback_names)
            .await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            info!(generation, %date, "discarding stale order-book load");
            return Ok(LoadOutcome::Stale);
        }

        let loaded_date = match fetched.source {
            DaySource::Today => date,
            DaySource::Yesterday => yesterday.unwrap_or(date),
        };
        let rows = self.normalize.normalize_orderbook(&fetched.data);

        let mut state = self.state.write().await;
        info!(date = %loaded_date, rows = rows.len(), path = %fetched.path, "order book loaded");
        state.rows = rows;
        state.target_date = Some(loaded_date);
        state.pinned = pin;
        state.page = 0;
        Ok(LoadOutcome::Applied)
    }

    /// Move one calendar day back (`delta < 0`) or forward (`delta > 0`)
    /// without probing. Returns `None` when the move would pass `today`.
    /// Landing on `today` returns to following live data.
    pub async fn shift_day(&self, delta: i32, today: NaiveDate) -> Result<Option<NaiveDate>, CoreError> {
        if delta == 0 {
            return Ok(None);
        }
        let current = self.target_date().await.unwrap_or(today);
        let Some(next) = shift(current, delta.signum()) else {
            return Ok(None);
        };
        if next > today {
            debug!(%next, %today, "order book already on today");
            return Ok(None);
        }
        match self.load(next, next != today).await? {
            LoadOutcome::Applied => Ok(self.target_date().await),
            LoadOutcome::Stale => Ok(None),
        }
    }

    /// Select a zero-based page (clamped) and return it.
    pub async fn page(&self, index: usize) -> OrderbookPage {
        let mut state = self.state.write().await;
        let page = self.orderbook.page(&state.rows, index, self.page_size);
        state.page = page.index;
        page
    }

    pub async fn current_page(&self) -> OrderbookPage {
        let state = self.state.read().await;
        self.orderbook.page(&state.rows, state.page, self.page_size)
    }

    pub async fn stats(&self) -> Option<OrderbookStats> {
        self.orderbook.stats(&self.state.read().await.rows)
    }

    pub async fn rows(&self) -> Vec<OrderbookRow> {
        self.state.read().await.rows.clone()
    }

    pub async fn target_date(&self) -> Option<NaiveDate> {
        self.state.read().await.target_date
    }

    pub async fn is_pinned(&self) -> bool {
        self.state.read().await.pinned
    }

    /// Spawn a task that reloads the current day on every tick.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn_polling(
        self: Arc<Self>,
        mut subscription: crate::scheduler::TickSubscription,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(tick) = subscription.next().await {
                if let Err(e) = self.autoload(crate::today()).await {
                    tracing::warn!(tick, error = %e, "order-book reload failed, keeping previous data");
                }
            }
        })
    }
}
