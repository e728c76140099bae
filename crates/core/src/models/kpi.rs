use serde::{Deserialize, Serialize};

use super::market::Tone;
use super::signal::Signal;

/// Headline tiles computed from the live dataset.
///
/// `None` means "no data" and is rendered as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_trades: usize,
    pub closed: usize,
    pub open: usize,
    /// Closed trades with `net_pnl > 0`.
    pub tp_hits: usize,
    /// Closed trades with `net_pnl <= 0`.
    pub sl_hits: usize,
    pub win_rate_pct: Option<f64>,
    pub avg_rr: Option<f64>,
    pub avg_net_pnl: Option<f64>,
    /// Sum of closed-trade net PnL.
    pub total_net_pnl: f64,
    pub last_capital: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub elapsed_days: Option<i64>,
}

/// One card of the finance panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceMetric {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

/// Finance cards plus the totals strip underneath them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceReport {
    pub metrics: Vec<FinanceMetric>,
    pub overall_net: f64,
    pub last_capital: Option<f64>,
    pub starting_capital: Option<f64>,
}

// ── Trades table ────────────────────────────────────────────────────

/// Status filter of the trades table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

/// Side filter of the trades table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideFilter {
    #[default]
    All,
    Long,
    Short,
}

/// Outcome filter of the trades table (matched against the outcome label).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFilter {
    #[default]
    All,
    Tp,
    Sl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilter {
    pub status: StatusFilter,
    pub side: SideFilter,
    pub result: ResultFilter,
}

/// A signal prepared for the trades table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    /// Parsed signal time, when it could be parsed.
    pub timestamp: Option<i64>,
    /// e.g. `"CLOSED / TP"`, `"OPEN / LONG"`.
    pub status_label: String,
    pub status_tone: Tone,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePage {
    /// One-based, clamped into `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub rows: Vec<TradeRow>,
}
