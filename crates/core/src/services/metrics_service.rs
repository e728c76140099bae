use serde_json::Value;

use crate::models::capital::{CapitalPoint, EquityPoint, PnlBar};
use crate::models::kpi::{FinanceMetric, FinanceReport, KpiSummary};
use crate::models::market::Tone;
use crate::models::signal::{Signal, SignalStatus, StrategyResults};
use crate::services::normalize_service::{format_minute, NormalizeService};

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Strategy root fields shown on the finance panel, with their labels.
const FINANCE_LABELS: [(&str, &str); 8] = [
    ("starting", "Starting Capital"),
    ("gross", "Gross PnL"),
    ("fees", "Total Fees Paid"),
    ("net", "Net PnL"),
    ("exposure", "Active Exposure"),
    ("available", "Available"),
    ("unrealized", "Unrealized PnL"),
    ("projected", "Projected Balance"),
];

/// Computes derived figures from normalized capital and signal data.
///
/// Everything is recomputed from scratch on each call; inputs are small
/// in-memory slices and nothing is cached between loads.
pub struct MetricsService {
    normalize: NormalizeService,
}

impl MetricsService {
    pub fn new() -> Self {
        Self {
            normalize: NormalizeService::new(),
        }
    }

    // ── Capital series ──────────────────────────────────────────────

    /// Consecutive capital differences: `n` points give `n - 1` bars, each
    /// tagged with the later timestamp.
    pub fn pnl_bars(&self, capital: &[CapitalPoint]) -> Vec<PnlBar> {
        capital
            .windows(2)
            .map(|w| PnlBar {
                timestamp: w[1].timestamp,
                delta: w[1].capital - w[0].capital,
            })
            .collect()
    }

    /// Most negative distance from the running peak, or `None` without data.
    /// Always `<= 0`.
    pub fn max_drawdown(&self, capital: &[CapitalPoint]) -> Option<f64> {
        let first = capital.first()?;
        let mut peak = first.capital;
        let mut worst = 0.0_f64;
        for point in capital {
            peak = peak.max(point.capital);
            worst = worst.min(point.capital - peak);
        }
        Some(worst)
    }

    /// Percent change from the first capital value, scaled by `amplify`.
    /// A zero or missing start value falls back to 1 so the curve stays finite.
    pub fn equity_curve(&self, capital: &[CapitalPoint], amplify: f64) -> Vec<EquityPoint> {
        let start = capital
            .first()
            .map(|p| p.capital)
            .filter(|c| c.is_finite() && *c != 0.0)
            .unwrap_or(1.0);

        capital
            .iter()
            .map(|p| EquityPoint {
                timestamp: p.timestamp,
                relative_pct: (p.capital - start) / start * 100.0 * amplify,
            })
            .filter(|p| p.relative_pct.is_finite())
            .collect()
    }

    // ── Signal statistics ───────────────────────────────────────────

    /// Share of CLOSED signals with positive net PnL, in percent.
    pub fn win_rate(&self, signals: &[Signal]) -> Option<f64> {
        let closed: Vec<&Signal> = closed(signals).collect();
        if closed.is_empty() {
            return None;
        }
        let wins = closed.iter().filter(|s| s.is_win()).count();
        Some(wins as f64 / closed.len() as f64 * 100.0)
    }

    /// Mean risk/reward of CLOSED signals (non-finite values count as zero).
    pub fn average_rr(&self, signals: &[Signal]) -> Option<f64> {
        mean(closed(signals).map(Signal::rrr_or_zero))
    }

    /// Mean net PnL of CLOSED signals (non-finite values count as zero).
    pub fn average_net_pnl(&self, signals: &[Signal]) -> Option<f64> {
        mean(closed(signals).map(Signal::net_pnl_or_zero))
    }

    pub fn total_net_pnl(&self, signals: &[Signal]) -> f64 {
        closed(signals).map(Signal::net_pnl_or_zero).sum()
    }

    /// Earliest parseable signal timestamp.
    pub fn first_signal_timestamp(&self, signals: &[Signal]) -> Option<i64> {
        self.signal_timestamps(signals).filter(|t| *t > 0).min()
    }

    /// Whole days between the first and last signal, at least one.
    pub fn elapsed_days(&self, signals: &[Signal]) -> Option<i64> {
        let (min, max) = self
            .signal_timestamps(signals)
            .fold(None, |acc: Option<(i64, i64)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })?;
        let days = ((max as f64 - min as f64) / DAY_MS).round() as i64;
        Some(days.max(1))
    }

    /// Headline KPI tiles for the live dataset.
    pub fn kpi_summary(&self, capital: &[CapitalPoint], strategy: &StrategyResults) -> KpiSummary {
        let signals = &strategy.signals;
        let closed_count = closed(signals).count();
        let tp_hits = closed(signals).filter(|s| s.is_win()).count();

        KpiSummary {
            total_trades: signals.len(),
            closed: closed_count,
            open: signals
                .iter()
                .filter(|s| s.status == SignalStatus::Open)
                .count(),
            tp_hits,
            sl_hits: closed_count - tp_hits,
            win_rate_pct: self.win_rate(signals),
            avg_rr: self.average_rr(signals),
            avg_net_pnl: self.average_net_pnl(signals),
            total_net_pnl: self.total_net_pnl(signals),
            last_capital: capital.last().map(|p| p.capital),
            max_drawdown: self.max_drawdown(capital),
            elapsed_days: self.elapsed_days(signals),
        }
    }

    // ── Finance panel ───────────────────────────────────────────────

    /// Finance cards: strategy start, last capital row metrics, strategy root
    /// fields, or derived fallbacks when neither is present.
    pub fn finance_report(&self, capital: &[CapitalPoint], strategy: &StrategyResults) -> FinanceReport {
        let mut metrics = Vec::new();

        if let Some(map) = capital.last().and_then(|p| p.metrics.as_ref()) {
            for (key, value) in map {
                metrics.push(finance_metric(key, display_value(value)));
            }
        }

        for (key, label) in FINANCE_LABELS {
            if let Some(value) = strategy_field(strategy, key) {
                metrics.push(finance_metric(label, display_value(value)));
            }
        }

        let overall_net = self.total_net_pnl(&strategy.signals);
        let last_capital = capital.last().map(|p| p.capital);

        if metrics.is_empty() {
            metrics.push(finance_metric("Net PnL (closed)", overall_net.to_string()));
            if let Some(last) = last_capital {
                metrics.push(finance_metric("Last Capital", last.to_string()));
            }
        }

        let start = self
            .first_signal_timestamp(&strategy.signals)
            .or_else(|| capital.first().map(|p| p.timestamp))
            .filter(|t| *t > 0);
        if let Some(ts) = start {
            metrics.insert(
                0,
                FinanceMetric {
                    label: "Strategy Start".to_string(),
                    value: format_minute(ts),
                    tone: Tone::Neutral,
                },
            );
        }

        FinanceReport {
            metrics,
            overall_net,
            last_capital,
            starting_capital: capital.first().map(|p| p.capital),
        }
    }

    fn signal_timestamps<'a>(&'a self, signals: &'a [Signal]) -> impl Iterator<Item = i64> + 'a {
        signals
            .iter()
            .filter_map(|s| s.raw_time())
            .filter_map(|v| self.normalize.parse_timestamp(v))
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

fn closed(signals: &[Signal]) -> impl Iterator<Item = &Signal> {
    signals.iter().filter(|s| s.status.is_closed())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn strategy_field<'a>(strategy: &'a StrategyResults, key: &str) -> Option<&'a Value> {
    match key {
        "starting" => strategy.starting.as_ref(),
        "gross" => strategy.gross.as_ref(),
        "fees" => strategy.fees.as_ref(),
        "net" => strategy.net.as_ref(),
        "exposure" => strategy.exposure.as_ref(),
        "available" => strategy.available.as_ref(),
        "unrealized" => strategy.unrealized.as_ref(),
        "projected" => strategy.projected.as_ref(),
        _ => None,
    }
}

/// Render a JSON value the way it reads in the log: strings unquoted,
/// integral numbers without a trailing `.0`.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        },
        other => other.to_string(),
    }
}

fn finance_metric(label: &str, value: String) -> FinanceMetric {
    let tone = value_tone(&value);
    FinanceMetric {
        label: label.to_string(),
        value,
        tone,
    }
}

/// Tone of a displayed figure after stripping `,`, `$` and spaces.
pub fn value_tone(display: &str) -> Tone {
    let cleaned: String = display
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v > 0.0 => Tone::Positive,
        Ok(v) if v < 0.0 => Tone::Negative,
        _ => Tone::Neutral,
    }
}
