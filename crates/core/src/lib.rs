pub mod errors;
pub mod models;
pub mod providers;
#[cfg(not(target_arch = "wasm32"))]
pub mod scheduler;
pub mod services;
pub mod volume;

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use errors::CoreError;
use models::{
    capital::{CapitalPoint, EquityPoint, PnlBar},
    indicator::IndicatorReport,
    kpi::{FinanceReport, KpiSummary, TradeFilter, TradePage},
    log_file::LogKind,
    market::{LiveSignal, MtfRow},
    settings::Settings,
    signal::StrategyResults,
};
use providers::traits::LogSource;
use services::{
    fetch_service::LogFetcher, indicator_service::IndicatorService,
    market_service::MarketService, metrics_service::MetricsService,
    navigator_service::DayNavigator, normalize_service::NormalizeService,
    trades_service::TradesService,
};

/// Result of a reload that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started while this one was in flight; its data was dropped.
    Stale,
}

/// Capital series plus strategy results for one day.
#[derive(Debug, Clone, Default)]
struct Dataset {
    capital: Vec<CapitalPoint>,
    strategy: StrategyResults,
}

#[derive(Debug, Default)]
struct ViewState {
    /// Most recent data; KPIs, finance, indicator tables and trades read this.
    live: Dataset,
    /// Capital series behind the chart. Follows `live` until day navigation
    /// pins it to another date.
    chart: Vec<CapitalPoint>,
    /// Date pinned by navigation, `None` while following live data.
    target_date: Option<NaiveDate>,
    market: Vec<Value>,
}

/// Equity dashboard: live KPIs, a day-navigable capital chart, indicator
/// accuracy tables, the trades table and the latest market snapshot.
#[must_use]
pub struct EquityViewer {
    fetcher: LogFetcher,
    navigator: DayNavigator,
    normalize: NormalizeService,
    metrics: MetricsService,
    indicators: IndicatorService,
    trades: TradesService,
    market: MarketService,
    settings: Settings,
    state: RwLock<ViewState>,
    live_generation: AtomicU64,
    chart_generation: AtomicU64,
}

impl std::fmt::Debug for EquityViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquityViewer")
            .field("source", &self.fetcher.base_paths())
            .field("live_generation", &self.live_generation.load(Ordering::Relaxed))
            .field("chart_generation", &self.chart_generation.load(Ordering::Relaxed))
            .finish()
    }
}

impl EquityViewer {
    /// Build a viewer over `source`. Settings are validated up front.
    pub fn new(source: Arc<dyn LogSource>, settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let fetcher = LogFetcher::new(source, &settings);
        let navigator = DayNavigator::new(fetcher.clone(), &settings);

        Ok(Self {
            fetcher,
            navigator,
            normalize: NormalizeService::new(),
            metrics: MetricsService::new(),
            indicators: IndicatorService::new(),
            trades: TradesService::new(),
            market: MarketService::new(),
            settings,
            state: RwLock::new(ViewState::default()),
            live_generation: AtomicU64::new(0),
            chart_generation: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Load today's capital, strategy and market logs (each falling back to
    /// yesterday) and replace the live dataset with whatever arrived.
    ///
    /// The chart dataset follows along unless navigation pinned it to another
    /// day. Fails with [`CoreError::LoadFailed`] only when nothing loaded; the
    /// previous state is kept in that case.
    pub async fn auto_load(&self, today: NaiveDate) -> Result<LoadOutcome, CoreError> {
        let generation = self.live_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let chart_generation = self.chart_generation.load(Ordering::SeqCst);

        let (capital, strategy, market) = tokio::join!(
            self.fetcher.fetch_daily(LogKind::Capital, today),
            self.fetcher.fetch_daily(LogKind::Strategy, today),
            self.fetcher.fetch_daily(LogKind::Market, today),
        );

        if self.live_generation.load(Ordering::SeqCst) != generation {
            info!(generation, "discarding stale live load");
            return Ok(LoadOutcome::Stale);
        }

        let first_error = [&capital, &strategy, &market]
            .into_iter()
            .find_map(|r| r.as_ref().err().cloned());

        let capital = capital.ok().map(|f| self.normalize.normalize_capital(&f.data));
        let strategy = match strategy {
            Ok(f) => {
                let parsed = self.normalize.normalize_strategy(&f.data);
                if parsed.is_none() {
                    warn!(path = %f.path, "strategy results have no signals array");
                }
                parsed
            }
            Err(_) => None,
        };
        let market = market.ok().map(|f| self.normalize.normalize_market(&f.data));

        if capital.is_none() && strategy.is_none() && market.is_none() {
            return Err(first_error.unwrap_or_else(|| CoreError::LoadFailed {
                file: LogKind::Capital.file_name(today),
            }));
        }

        let mut state = self.state.write().await;
        if let Some(capital) = capital {
            state.live.capital = capital;
        }
        if let Some(strategy) = strategy {
            state.live.strategy = strategy;
        }
        if let Some(market) = market {
            state.market = market;
        }

        let following = state.target_date.is_none_or(|d| d == today);
        if following && self.chart_generation.load(Ordering::SeqCst) == chart_generation {
            state.chart = state.live.capital.clone();
            state.target_date = None;
        }

        info!(
            capital_points = state.live.capital.len(),
            signals = state.live.strategy.signals.len(),
            snapshots = state.market.len(),
            "live data loaded"
        );
        Ok(LoadOutcome::Applied)
    }

    /// Move the chart to the nearest earlier (`delta < 0`) or later
    /// (`delta > 0`) day that has logs. Returns the new date, or `None` when
    /// no such day exists; the view is unchanged in that case.
    pub async fn shift_day(&self, delta: i32, today: NaiveDate) -> Result<Option<NaiveDate>, CoreError> {
        let start = self.target_date().await.unwrap_or(today);
        let Some(date) = self.navigator.find_nearest_day(start, delta, today).await else {
            return Ok(None);
        };

        match self.load_chart_for_date(date).await? {
            LoadOutcome::Applied => Ok(Some(date)),
            LoadOutcome::Stale => Ok(None),
        }
    }

    /// Move the chart to exactly `date`. Both of that day's capital and strategy
    /// logs must load; only the capital series is kept. The live dataset is
    /// not touched.
    pub async fn load_chart_for_date(&self, date: NaiveDate) -> Result<LoadOutcome, CoreError> {
        let generation = self.chart_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let timeout = self.settings.chart_load_timeout();

        let (capital, strategy) = tokio::join!(
            self.fetcher.fetch_for_date(LogKind::Capital, date, timeout),
            self.fetcher.fetch_for_date(LogKind::Strategy, date, timeout),
        );
        let capital = capital?;
        strategy?;

        if self.chart_generation.load(Ordering::SeqCst) != generation {
            info!(generation, %date, "discarding stale chart load");
            return Ok(LoadOutcome::Stale);
        }

        let points = self.normalize.normalize_capital(&capital.data);

        let mut state = self.state.write().await;
        state.chart = points;
        state.target_date = Some(date);
        info!(%date, capital_points = state.chart.len(), "chart moved");
        Ok(LoadOutcome::Applied)
    }

    /// Spawn a task that reloads live data on every tick of `subscription`.
    /// The task ends when the ticker is dropped.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn_polling(
        self: Arc<Self>,
        mut subscription: scheduler::TickSubscription,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(tick) = subscription.next().await {
                if let Err(e) = self.auto_load(today()).await {
                    warn!(tick, error = %e, "equity reload failed, keeping previous data");
                }
            }
        })
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Date the chart is pinned to, `None` while following live data.
    pub async fn target_date(&self) -> Option<NaiveDate> {
        self.state.read().await.target_date
    }

    pub async fn kpis(&self) -> KpiSummary {
        let state = self.state.read().await;
        self.metrics
            .kpi_summary(&state.live.capital, &state.live.strategy)
    }

    pub async fn finance(&self) -> FinanceReport {
        let state = self.state.read().await;
        self.metrics
            .finance_report(&state.live.capital, &state.live.strategy)
    }

    pub async fn indicator_report(&self) -> IndicatorReport {
        let state = self.state.read().await;
        self.indicators.report(&state.live.strategy.signals)
    }

    /// One-based page of the trades table using the configured page size.
    pub async fn trades_page(&self, filter: &TradeFilter, page: usize) -> TradePage {
        let state = self.state.read().await;
        self.trades.page(
            &state.live.strategy.signals,
            filter,
            page,
            self.settings.page_size,
        )
    }

    pub async fn pnl_bars(&self) -> Vec<PnlBar> {
        self.metrics.pnl_bars(&self.state.read().await.chart)
    }

    /// Relative equity curve, scaled by the configured factor when `amplify` is set.
    pub async fn equity_curve(&self, amplify: bool) -> Vec<EquityPoint> {
        let factor = if amplify { self.settings.amplify_factor } else { 1.0 };
        self.metrics
            .equity_curve(&self.state.read().await.chart, factor)
    }

    pub async fn chart_capital(&self) -> Vec<CapitalPoint> {
        self.state.read().await.chart.clone()
    }

    pub async fn live_signal(&self) -> LiveSignal {
        self.market.live_signal(&self.state.read().await.market)
    }

    pub async fn mtf_rows(&self) -> Vec<MtfRow> {
        self.market.mtf_rows(&self.state.read().await.market)
    }
}

/// Local calendar date, the day whose logs count as "today".
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
