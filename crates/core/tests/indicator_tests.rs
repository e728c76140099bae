// ═══════════════════════════════════════════════════════════════════
// Indicator Tests — flag parsing, aggregation, ordering, donut totals
// ═══════════════════════════════════════════════════════════════════

use serde_json::{json, Value};

use signals_dashboard_core::models::indicator::IndicatorGroup;
use signals_dashboard_core::models::signal::{Signal, SignalStatus};
use signals_dashboard_core::services::indicator_service::{is_truthy, IndicatorService};

fn closed_with(core: Value, support: Value, net_pnl: f64) -> Signal {
    Signal {
        status: SignalStatus::Closed,
        net_pnl: Some(net_pnl),
        core_debug: Some(core),
        support_debug: Some(support),
        ..Signal::default()
    }
}

fn row<'a>(
    rows: &'a [signals_dashboard_core::models::indicator::IndicatorRow],
    name: &str,
) -> &'a signals_dashboard_core::models::indicator::IndicatorRow {
    rows.iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("row {name} missing"))
}

// ── Aggregation ─────────────────────────────────────────────────────

mod aggregate {
    use super::*;

    #[test]
    fn rsi_macd_one_win_one_loss() {
        let signals = vec![
            closed_with(json!({"rsi_macd": true}), json!({}), 5.0),
            closed_with(json!({"rsi_macd": true}), json!({}), -3.0),
        ];
        let rows = IndicatorService::new().aggregate(&signals, IndicatorGroup::Core);
        let r = row(&rows, "RSI/MACD Momentum Trigger");
        assert_eq!((r.tp, r.sl), (1, 1));
        assert_eq!(r.key, "rsi_macd");
        assert_eq!(rows[0].name, "RSI/MACD Momentum Trigger");
    }

    #[test]
    fn full_catalog_without_signals() {
        let svc = IndicatorService::new();
        for group in IndicatorGroup::ALL {
            let rows = svc.aggregate(&[], group);
            assert_eq!(rows.len(), group.catalog().len());
            assert!(rows.iter().all(|r| r.tp == 0 && r.sl == 0));
        }
    }

    #[test]
    fn empty_rows_sorted_by_name() {
        let rows = IndicatorService::new().aggregate(&[], IndicatorGroup::Support);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ADX + Momentum Strength",
                "Liquidity Zone Proximity",
                "Multi-Timeframe Agreement",
                "Order Imbalance Dominance",
                "VWAP Positional Bias",
            ]
        );
    }

    #[test]
    fn open_signals_ignored() {
        let mut s = closed_with(json!({"ema_cross": 1}), json!({}), 5.0);
        s.status = SignalStatus::Open;
        let rows = IndicatorService::new().aggregate(&[s], IndicatorGroup::Core);
        assert!(rows.iter().all(|r| r.total() == 0));
    }

    #[test]
    fn stringified_flags() {
        let signals = vec![closed_with(
            json!("{\"ema_cross\": true, \"trend_confirm\": 0}"),
            json!("not json"),
            2.0,
        )];
        let svc = IndicatorService::new();
        let core = svc.aggregate(&signals, IndicatorGroup::Core);
        assert_eq!(row(&core, "EMA Trend Confirmation").tp, 1);
        assert_eq!(row(&core, "Trend Confirm (Ichimoku + RSI + MACD)").total(), 0);

        let support = svc.aggregate(&signals, IndicatorGroup::Support);
        assert!(support.iter().all(|r| r.total() == 0));
    }

    #[test]
    fn extra_keys_get_rows() {
        let signals = vec![
            closed_with(json!({"custom_probe": true, "17": true}), json!({}), -1.0),
            closed_with(json!({"custom_probe": "yes", "3": 1}), json!({}), 1.0),
        ];
        let rows = IndicatorService::new().aggregate(&signals, IndicatorGroup::Core);
        assert_eq!(rows.len(), IndicatorGroup::Core.catalog().len() + 2);

        let custom = row(&rows, "custom_probe");
        assert_eq!((custom.tp, custom.sl), (1, 1));
        let unknown = row(&rows, "Unknown");
        assert_eq!((unknown.tp, unknown.sl), (1, 1));
    }

    #[test]
    fn array_flags_count_by_index() {
        let signals = vec![
            closed_with(json!(["rsi_macd", true]), json!({}), 5.0),
            closed_with(json!("[1]"), json!({}), -1.0),
        ];
        let svc = IndicatorService::new();
        let rows = svc.aggregate(&signals, IndicatorGroup::Core);
        let unknown = row(&rows, "Unknown");
        assert_eq!((unknown.tp, unknown.sl), (2, 1));
        assert_eq!(rows[0].name, "Unknown");

        let donut = svc.donut_totals(&signals, IndicatorGroup::Core);
        assert_eq!((donut.tp, donut.sl), (1, 1));
    }

    #[test]
    fn ordering_total_then_delta_then_name() {
        let signals = vec![
            // volatility_spike: 2 wins; macd_histogram: 1 win 1 loss; ema_cross: 1 win
            closed_with(json!({"volatility_spike": true, "macd_histogram": true}), json!({}), 1.0),
            closed_with(json!({"volatility_spike": true, "ema_cross": true}), json!({}), 1.0),
            closed_with(json!({"macd_histogram": true}), json!({}), -1.0),
        ];
        let rows = IndicatorService::new().aggregate(&signals, IndicatorGroup::Core);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Volatility Spike Detection",
                "MACD Histogram Growth",
                "EMA Trend Confirmation",
                "RSI/MACD Momentum Trigger",
                "Trend Confirm (Ichimoku + RSI + MACD)",
            ]
        );
    }

    #[test]
    fn ordering_is_deterministic() {
        let signals = vec![closed_with(
            json!({"b_extra": true, "a_extra": true, "rsi_macd": true}),
            json!({}),
            1.0,
        )];
        let svc = IndicatorService::new();
        let first = svc.aggregate(&signals, IndicatorGroup::Core);
        for _ in 0..10 {
            assert_eq!(svc.aggregate(&signals, IndicatorGroup::Core), first);
        }
        let names: Vec<&str> = first.iter().take(3).map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a_extra", "b_extra", "RSI/MACD Momentum Trigger"]);
    }
}

// ── Tables & totals ─────────────────────────────────────────────────

mod tables {
    use super::*;

    #[test]
    fn donut_counts_each_signal_once() {
        let signals = vec![
            closed_with(json!({"rsi_macd": true, "ema_cross": true}), json!({"vwap_bias": true}), 3.0),
            closed_with(json!({"rsi_macd": true}), json!({}), -1.0),
            closed_with(json!({}), json!({}), 1.0),
        ];
        let table = IndicatorService::new().table(&signals, IndicatorGroup::Core);
        assert_eq!((table.donut.tp, table.donut.sl), (1, 1));
        assert_eq!((table.row_totals.tp, table.row_totals.sl), (2, 1));
        assert_eq!(table.group, IndicatorGroup::Core);
    }

    #[test]
    fn report_has_both_groups() {
        let signals = vec![closed_with(json!({}), json!({"liquidity_zone": true}), 2.0)];
        let report = IndicatorService::new().report(&signals);
        assert_eq!(report.core.donut.total(), 0);
        assert_eq!(report.support.donut.tp, 1);
        assert_eq!(report.support.rows[0].name, "Liquidity Zone Proximity");
        assert!((report.support.rows[0].accuracy_pct() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([])));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }
}
