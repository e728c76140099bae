// ═══════════════════════════════════════════════════════════════════
// Viewer Tests — EquityViewer (live vs chart datasets, navigation,
// stale-load discard) and VolumeViewer (order-book days & paging)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use signals_dashboard_core::errors::CoreError;
use signals_dashboard_core::models::kpi::{ResultFilter, StatusFilter, TradeFilter};
use signals_dashboard_core::models::log_file::LogKind;
use signals_dashboard_core::models::market::{SignalDirection, Timeframe, Tone};
use signals_dashboard_core::models::settings::Settings;
use signals_dashboard_core::providers::traits::LogSource;
use signals_dashboard_core::volume::VolumeViewer;
use signals_dashboard_core::{EquityViewer, LoadOutcome};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Mock Source
// ═══════════════════════════════════════════════════════════════════

/// In-memory log directory. Paths in `gated` block until `release()`.
struct MemorySource {
    files: Mutex<HashMap<String, Value>>,
    gated: Mutex<HashSet<String>>,
    gate: Semaphore,
    calls: Mutex<Vec<String>>,
}

impl MemorySource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(HashMap::new()),
            gated: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn put(&self, kind: LogKind, date: NaiveDate, data: Value) {
        self.files.lock().unwrap().insert(kind.file_name(date), data);
    }

    fn clear(&self) {
        self.files.lock().unwrap().clear();
    }

    fn hold(&self, kind: LogKind, date: NaiveDate) {
        self.gated.lock().unwrap().insert(kind.file_name(date));
    }

    fn release(&self) {
        self.gate.add_permits(1_000);
    }

    fn was_called(&self, kind: LogKind, date: NaiveDate) -> bool {
        let name = kind.file_name(date);
        self.calls.lock().unwrap().iter().any(|c| *c == name)
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LogSource for MemorySource {
    fn name(&self) -> &str {
        "Memory"
    }

    async fn fetch_json(&self, path: &str, _timeout: Duration) -> Result<Value, CoreError> {
        self.calls.lock().unwrap().push(path.to_string());
        let gated = self.gated.lock().unwrap().contains(path);
        if gated {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| CoreError::Network(e.to_string()))?;
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::HttpStatus {
                url: path.into(),
                status: 404,
            })
    }

    async fn probe(&self, path: &str, timeout: Duration) -> Result<(), CoreError> {
        self.fetch_json(path, timeout).await.map(|_| ())
    }
}

fn settings() -> Settings {
    Settings {
        base_paths: vec![String::new()],
        ..Settings::default()
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn capital(date: NaiveDate, values: &[f64]) -> Value {
    let day = date.format("%Y-%m-%d");
    Value::Array(
        values
            .iter()
            .enumerate()
            .map(|(i, c)| json!({"time": format!("{day} {:02}:00", 10 + i), "capital": c}))
            .collect(),
    )
}

fn strategy(date: NaiveDate, pnls: &[f64]) -> Value {
    let day = date.format("%Y-%m-%d");
    let signals: Vec<Value> = pnls
        .iter()
        .enumerate()
        .map(|(i, pnl)| {
            let outcome = if *pnl > 0.0 { "TP" } else { "SL" };
            json!({
                "time": format!("{day} {:02}:30", 10 + i),
                "status": "CLOSED",
                "side": "LONG",
                "net_pnl": pnl,
                "rrr": 1.5,
                "validated": outcome,
                "core_debug": {"rsi_macd": true},
                "support_debug": "{\"vwap_bias\": 1}"
            })
        })
        .collect();
    json!({ "signals": signals, "starting": 100 })
}

fn market() -> Value {
    json!([
        {"signal": "SELL", "price": 90},
        {
            "signal": "BUY",
            "price": 100,
            "tp": 110,
            "sl": 95,
            "multi_tf_context": {"snapshots": {
                "5m": {"signal": "BUY", "rsi": 60, "macd": -0.5, "adx": 30, "ema50": 1, "ema200": 2},
                "30m": {"signal": "HOLD", "rsi": 50}
            }},
            "tf4h": {"signal": "SELL", "rsi": 40}
        }
    ])
}

fn seed_day(source: &MemorySource, date: NaiveDate, capital_values: &[f64], pnls: &[f64]) {
    source.put(LogKind::Capital, date, capital(date, capital_values));
    source.put(LogKind::Strategy, date, strategy(date, pnls));
}

// ═══════════════════════════════════════════════════════════════════
//  EquityViewer
// ═══════════════════════════════════════════════════════════════════

mod equity_viewer {
    use super::*;

    const TODAY: (i32, u32, u32) = (2025, 1, 10);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn rejects_invalid_settings() {
        let bad = Settings {
            page_size: 0,
            ..settings()
        };
        assert!(matches!(
            EquityViewer::new(MemorySource::new(), bad),
            Err(CoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn auto_load_fills_live_and_chart() {
        let source = MemorySource::new();
        seed_day(&source, today(), &[100.0, 110.0, 90.0], &[5.0, -3.0]);
        source.put(LogKind::Market, today(), market());
        let viewer = EquityViewer::new(source.clone(), settings()).unwrap();

        assert_eq!(viewer.auto_load(today()).await.unwrap(), LoadOutcome::Applied);

        let kpi = viewer.kpis().await;
        assert_eq!(kpi.closed, 2);
        assert_eq!(kpi.win_rate_pct, Some(50.0));
        assert_eq!(kpi.max_drawdown, Some(-20.0));
        assert_eq!(kpi.last_capital, Some(90.0));

        let bars = viewer.pnl_bars().await;
        assert_eq!(bars.iter().map(|b| b.delta).collect::<Vec<_>>(), vec![10.0, -20.0]);
        assert_eq!(viewer.target_date().await, None);

        let report = viewer.indicator_report().await;
        let rsi = report
            .core
            .rows
            .iter()
            .find(|r| r.key == "rsi_macd")
            .unwrap();
        assert_eq!((rsi.tp, rsi.sl), (1, 1));
        assert_eq!(report.support.donut.total(), 2);

        let finance = viewer.finance().await;
        assert_eq!(finance.metrics[0].label, "Strategy Start");
        assert_eq!(finance.metrics[1].label, "Starting Capital");
    }

    #[tokio::test]
    async fn market_snapshot_views() {
        let source = MemorySource::new();
        source.put(LogKind::Market, today(), market());
        let viewer = EquityViewer::new(source, settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        let live = viewer.live_signal().await;
        assert_eq!(live.direction, SignalDirection::Buy);
        assert_eq!(live.price, Some(100.0));
        assert_eq!(live.entry, Some(100.0));
        assert_eq!(live.tp, Some(110.0));
        assert_eq!(live.sl, Some(95.0));

        let rows = viewer.mtf_rows().await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].timeframe, Timeframe::M5);
        assert_eq!(rows[0].rsi.unwrap().tone, Tone::Positive);
        assert_eq!(rows[0].macd.unwrap().tone, Tone::Negative);
        assert_eq!(rows[0].adx.unwrap().tone, Tone::Positive);
        assert_eq!(rows[0].ema, Some((1.0, 2.0)));
        assert_eq!(rows[1].direction, SignalDirection::None);
        assert_eq!(rows[1].rsi.unwrap().tone, Tone::Neutral);
        assert_eq!(rows[2].direction, SignalDirection::Sell);
        assert_eq!(rows[2].rsi.unwrap().tone, Tone::Negative);
    }

    #[tokio::test]
    async fn strong_signal_has_no_entry() {
        let source = MemorySource::new();
        source.put(
            LogKind::Market,
            today(),
            json!({"signal": "strong sell", "price": 5, "tp": 1}),
        );
        let viewer = EquityViewer::new(source, settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        let live = viewer.live_signal().await;
        assert_eq!(live.direction, SignalDirection::Sell);
        assert_eq!(live.raw.as_deref(), Some("STRONG SELL"));
        assert_eq!(live.entry, None);
        assert_eq!(live.tp, None);
    }

    #[tokio::test]
    async fn falls_back_to_yesterday() {
        let source = MemorySource::new();
        let yesterday = d(2025, 1, 9);
        seed_day(&source, yesterday, &[50.0, 60.0], &[1.0]);
        let viewer = EquityViewer::new(source, settings()).unwrap();

        viewer.auto_load(today()).await.unwrap();
        assert_eq!(viewer.kpis().await.last_capital, Some(60.0));
    }

    #[tokio::test]
    async fn nothing_available_keeps_prior_state() {
        let source = MemorySource::new();
        seed_day(&source, today(), &[100.0, 110.0], &[5.0]);
        let viewer = EquityViewer::new(source.clone(), settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();
        let before = viewer.kpis().await;

        source.clear();
        let err = viewer.auto_load(today()).await.unwrap_err();
        assert!(matches!(err, CoreError::LoadFailed { .. }));
        assert_eq!(viewer.kpis().await, before);
        assert_eq!(viewer.pnl_bars().await.len(), 1);
    }

    #[tokio::test]
    async fn partial_load_keeps_missing_parts() {
        let source = MemorySource::new();
        seed_day(&source, today(), &[100.0, 110.0], &[5.0, 1.0]);
        let viewer = EquityViewer::new(source.clone(), settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        source.clear();
        source.put(LogKind::Capital, today(), capital(today(), &[100.0, 130.0]));
        viewer.auto_load(today()).await.unwrap();

        let kpi = viewer.kpis().await;
        assert_eq!(kpi.last_capital, Some(130.0));
        assert_eq!(kpi.closed, 2);
    }

    #[tokio::test]
    async fn shift_day_moves_chart_only() {
        let source = MemorySource::new();
        let older = d(2025, 1, 7);
        seed_day(&source, today(), &[100.0, 110.0, 90.0], &[5.0, -3.0]);
        seed_day(&source, older, &[10.0, 15.0], &[2.0, 2.0, 2.0]);
        let viewer = EquityViewer::new(source.clone(), settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();
        let live_before = viewer.kpis().await;
        let report_before = viewer.indicator_report().await;

        assert_eq!(viewer.shift_day(-1, today()).await.unwrap(), Some(older));
        assert_eq!(viewer.target_date().await, Some(older));
        assert_eq!(
            viewer.pnl_bars().await.iter().map(|b| b.delta).collect::<Vec<_>>(),
            vec![5.0]
        );
        // Tables stay on the live dataset while the chart moves.
        let page = viewer.trades_page(&TradeFilter::default(), 1).await;
        assert_eq!(page.total_records, 2);
        assert_eq!(viewer.indicator_report().await, report_before);
        assert_eq!(viewer.kpis().await, live_before);

        // A live reload does not pull the chart back while it is pinned.
        viewer.auto_load(today()).await.unwrap();
        assert_eq!(viewer.target_date().await, Some(older));
        assert_eq!(viewer.pnl_bars().await.len(), 1);
    }

    #[tokio::test]
    async fn shift_forward_returns_to_today_and_follows_live() {
        let source = MemorySource::new();
        let older = d(2025, 1, 7);
        seed_day(&source, today(), &[100.0, 110.0, 90.0], &[5.0]);
        seed_day(&source, older, &[10.0, 15.0], &[2.0]);
        let viewer = EquityViewer::new(source.clone(), settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        viewer.shift_day(-1, today()).await.unwrap();
        assert_eq!(viewer.shift_day(1, today()).await.unwrap(), Some(today()));
        assert_eq!(viewer.pnl_bars().await.len(), 2);

        // Past today there is nothing to find.
        assert_eq!(viewer.shift_day(1, today()).await.unwrap(), None);

        seed_day(&source, today(), &[100.0, 110.0, 90.0, 95.0], &[5.0]);
        viewer.auto_load(today()).await.unwrap();
        assert_eq!(viewer.target_date().await, None);
        assert_eq!(viewer.pnl_bars().await.len(), 3);
    }

    #[tokio::test]
    async fn shift_without_older_day_leaves_view() {
        let source = MemorySource::new();
        seed_day(&source, today(), &[100.0, 110.0], &[5.0]);
        let viewer = EquityViewer::new(source, settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        assert_eq!(viewer.shift_day(-1, today()).await.unwrap(), None);
        assert_eq!(viewer.target_date().await, None);
        assert_eq!(viewer.pnl_bars().await.len(), 1);
    }

    #[tokio::test]
    async fn stale_live_load_is_discarded() {
        let source = MemorySource::new();
        let slow_day = d(2025, 1, 9);
        seed_day(&source, slow_day, &[1.0, 2.0], &[1.0]);
        seed_day(&source, today(), &[100.0, 110.0, 90.0], &[5.0]);
        source.hold(LogKind::Capital, slow_day);
        let viewer = Arc::new(EquityViewer::new(source.clone(), settings()).unwrap());

        let slow = {
            let viewer = Arc::clone(&viewer);
            tokio::spawn(async move { viewer.auto_load(slow_day).await })
        };
        while !source.was_called(LogKind::Capital, slow_day) {
            tokio::task::yield_now().await;
        }

        assert_eq!(viewer.auto_load(today()).await.unwrap(), LoadOutcome::Applied);
        source.release();
        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Stale);

        assert_eq!(viewer.kpis().await.last_capital, Some(90.0));
    }

    #[tokio::test]
    async fn stale_chart_load_is_discarded() {
        let source = MemorySource::new();
        let slow_day = d(2025, 1, 5);
        let fast_day = d(2025, 1, 6);
        seed_day(&source, slow_day, &[1.0, 2.0], &[1.0]);
        seed_day(&source, fast_day, &[3.0, 5.0, 4.0], &[1.0]);
        source.hold(LogKind::Capital, slow_day);
        let viewer = Arc::new(EquityViewer::new(source.clone(), settings()).unwrap());

        let slow = {
            let viewer = Arc::clone(&viewer);
            tokio::spawn(async move { viewer.load_chart_for_date(slow_day).await })
        };
        while !source.was_called(LogKind::Capital, slow_day) {
            tokio::task::yield_now().await;
        }

        viewer.load_chart_for_date(fast_day).await.unwrap();
        source.release();
        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Stale);
        assert_eq!(viewer.target_date().await, Some(fast_day));
        assert_eq!(viewer.pnl_bars().await.len(), 2);
    }

    #[tokio::test]
    async fn trades_page_filters_and_pages() {
        let source = MemorySource::new();
        seed_day(
            &source,
            today(),
            &[100.0],
            &[1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0],
        );
        let viewer = EquityViewer::new(source, settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        let all = viewer.trades_page(&TradeFilter::default(), 1).await;
        assert_eq!(all.total_records, 7);
        assert_eq!(all.total_pages, 2);
        assert_eq!(all.rows.len(), 5);
        assert!(all.rows.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        let last = viewer.trades_page(&TradeFilter::default(), 99).await;
        assert_eq!(last.page, 2);
        assert_eq!(last.rows.len(), 2);

        let tp_only = TradeFilter {
            result: ResultFilter::Tp,
            ..TradeFilter::default()
        };
        let tp = viewer.trades_page(&tp_only, 1).await;
        assert_eq!(tp.total_records, 4);
        assert!(tp.rows.iter().all(|r| r.status_label == "CLOSED / TP"));

        let open_only = TradeFilter {
            status: StatusFilter::Open,
            ..TradeFilter::default()
        };
        let open = viewer.trades_page(&open_only, 1).await;
        assert_eq!(open.total_records, 0);
        assert_eq!(open.total_pages, 1);
        assert_eq!(open.page, 1);
    }

    #[tokio::test]
    async fn equity_curve_amplification() {
        let source = MemorySource::new();
        seed_day(&source, today(), &[100.0, 110.0], &[1.0]);
        let viewer = EquityViewer::new(source, settings()).unwrap();
        viewer.auto_load(today()).await.unwrap();

        let plain = viewer.equity_curve(false).await;
        let amplified = viewer.equity_curve(true).await;
        assert!((plain[1].relative_pct - 10.0).abs() < 1e-9);
        assert!((amplified[1].relative_pct - 18.0).abs() < 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  VolumeViewer
// ═══════════════════════════════════════════════════════════════════

mod volume_viewer {
    use super::*;

    fn book(date: NaiveDate, rows: &[(f64, f64)]) -> Value {
        let day = date.format("%Y-%m-%d");
        Value::Array(
            rows.iter()
                .enumerate()
                .map(|(i, (buy, sell))| {
                    json!({"time": format!("{day} {:02}:00", i), "buy_volume": buy, "sell_volume": sell})
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn prefers_30m_file_and_computes_stats() {
        let source = MemorySource::new();
        let day = d(2025, 2, 1);
        source.put(LogKind::Orderbook30m, day, book(day, &[(10.0, 4.0), (3.0, 9.0)]));
        source.put(LogKind::Orderbook, day, book(day, &[(1.0, 1.0)]));
        let viewer = VolumeViewer::new(source, &settings()).unwrap();

        viewer.load_for_date(day).await.unwrap();
        let stats = viewer.stats().await.unwrap();
        assert_eq!(stats.total_buy, 13.0);
        assert_eq!(stats.total_sell, 13.0);
        assert_eq!(stats.net, 0.0);
        assert_eq!(stats.max_buy.buy, 10.0);
        assert_eq!(stats.max_sell.sell, 9.0);

        let rows = viewer.rows().await;
        assert_eq!(rows.last().unwrap().cumulative, 0.0);
    }

    #[tokio::test]
    async fn paging_newest_first_and_clamped() {
        let source = MemorySource::new();
        let day = d(2025, 2, 1);
        let entries: Vec<(f64, f64)> = (0..12).map(|i| (f64::from(i), 0.0)).collect();
        source.put(LogKind::Orderbook, day, book(day, &entries));
        let viewer = VolumeViewer::new(source, &settings()).unwrap();
        viewer.load_for_date(day).await.unwrap();

        let first = viewer.current_page().await;
        assert_eq!(first.index, 0);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_records, 12);
        assert_eq!(first.rows[0].buy, 11.0);

        let last = viewer.page(7).await;
        assert_eq!(last.index, 2);
        assert_eq!(last.rows.len(), 2);
        assert_eq!(last.rows[1].buy, 0.0);
        assert_eq!(viewer.current_page().await.index, 2);

        // Reload resets to the newest page.
        viewer.load_for_date(day).await.unwrap();
        assert_eq!(viewer.current_page().await.index, 0);
    }

    #[tokio::test]
    async fn fallback_moves_target_to_yesterday() {
        let source = MemorySource::new();
        let today = d(2025, 2, 2);
        let yesterday = d(2025, 2, 1);
        source.put(LogKind::Orderbook, yesterday, book(yesterday, &[(1.0, 2.0)]));
        let viewer = VolumeViewer::new(source.clone(), &settings()).unwrap();

        viewer.autoload(today).await.unwrap();
        assert_eq!(viewer.target_date().await, Some(yesterday));
        assert!(!viewer.is_pinned().await);

        // Once today's file shows up the next poll follows it.
        source.put(LogKind::Orderbook, today, book(today, &[(5.0, 1.0)]));
        viewer.autoload(today).await.unwrap();
        assert_eq!(viewer.target_date().await, Some(today));
    }

    #[tokio::test]
    async fn shift_day_is_bounded_by_today() {
        let source = MemorySource::new();
        let today = d(2025, 2, 2);
        let yesterday = d(2025, 2, 1);
        source.put(LogKind::Orderbook, today, book(today, &[(5.0, 1.0)]));
        source.put(LogKind::Orderbook, yesterday, book(yesterday, &[(1.0, 2.0), (1.0, 1.0)]));
        let viewer = VolumeViewer::new(source.clone(), &settings()).unwrap();
        viewer.autoload(today).await.unwrap();

        assert_eq!(viewer.shift_day(1, today).await.unwrap(), None);
        assert_eq!(viewer.target_date().await, Some(today));

        assert_eq!(viewer.shift_day(-1, today).await.unwrap(), Some(yesterday));
        assert!(viewer.is_pinned().await);
        assert_eq!(viewer.rows().await.len(), 2);

        // Polling keeps the pinned day.
        viewer.autoload(today).await.unwrap();
        assert_eq!(viewer.target_date().await, Some(yesterday));

        assert_eq!(viewer.shift_day(1, today).await.unwrap(), Some(today));
        assert!(!viewer.is_pinned().await);
    }

    #[tokio::test]
    async fn load_failure_keeps_rows() {
        let source = MemorySource::new();
        let day = d(2025, 2, 1);
        source.put(LogKind::Orderbook, day, book(day, &[(1.0, 2.0)]));
        let viewer = VolumeViewer::new(source.clone(), &settings()).unwrap();
        viewer.load_for_date(day).await.unwrap();

        source.clear();
        let calls_before = source.call_count();
        assert!(matches!(
            viewer.load_for_date(day).await,
            Err(CoreError::LoadFailed { .. })
        ));
        assert!(source.call_count() > calls_before);
        assert_eq!(viewer.rows().await.len(), 1);
        assert_eq!(viewer.target_date().await, Some(day));
    }

    #[tokio::test]
    async fn equal_volumes_pick_the_later_bucket() {
        let source = MemorySource::new();
        let day = d(2025, 2, 1);
        source.put(LogKind::Orderbook, day, book(day, &[(5.0, 7.0), (5.0, 7.0)]));
        let viewer = VolumeViewer::new(source, &settings()).unwrap();
        viewer.load_for_date(day).await.unwrap();

        let rows = viewer.rows().await;
        let stats = viewer.stats().await.unwrap();
        assert_eq!(stats.max_buy.timestamp, rows[1].timestamp);
        assert_eq!(stats.max_sell.timestamp, rows[1].timestamp);
    }

    #[tokio::test]
    async fn empty_day_has_no_stats() {
        let source = MemorySource::new();
        let day = d(2025, 2, 1);
        source.put(LogKind::Orderbook, day, json!([]));
        let viewer = VolumeViewer::new(source, &settings()).unwrap();
        viewer.load_for_date(day).await.unwrap();

        assert!(viewer.stats().await.is_none());
        let page = viewer.current_page().await;
        assert_eq!(page.total_pages, 1);
        assert!(page.rows.is_empty());
    }
}
