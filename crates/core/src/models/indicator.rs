use serde::{Deserialize, Serialize};
use std::fmt;

/// The two indicator-flag groups a signal carries debug maps for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorGroup {
    /// Entry triggers (`core_debug`).
    Core,
    /// Confirmation filters (`support_debug`).
    Support,
}

const CORE_CATALOG: &[(&str, &str)] = &[
    ("rsi_macd", "RSI/MACD Momentum Trigger"),
    ("ema_cross", "EMA Trend Confirmation"),
    ("volatility_spike", "Volatility Spike Detection"),
    ("macd_histogram", "MACD Histogram Growth"),
    ("trend_confirm", "Trend Confirm (Ichimoku + RSI + MACD)"),
];

const SUPPORT_CATALOG: &[(&str, &str)] = &[
    ("vwap_bias", "VWAP Positional Bias"),
    ("mtf_agreement", "Multi-Timeframe Agreement"),
    ("adx_momentum", "ADX + Momentum Strength"),
    ("order_dominance", "Order Imbalance Dominance"),
    ("liquidity_zone", "Liquidity Zone Proximity"),
];

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 2] = [IndicatorGroup::Core, IndicatorGroup::Support];

    /// Fixed, ordered `(flag key, display name)` pairs for this group.
    pub fn catalog(self) -> &'static [(&'static str, &'static str)] {
        match self {
            IndicatorGroup::Core => CORE_CATALOG,
            IndicatorGroup::Support => SUPPORT_CATALOG,
        }
    }

    /// Display name for a catalog key, if the key is part of this group.
    pub fn display_name(self, key: &str) -> Option<&'static str> {
        self.catalog()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| *name)
    }

    pub fn label(self) -> &'static str {
        match self {
            IndicatorGroup::Core => "Core",
            IndicatorGroup::Support => "Support",
        }
    }
}

impl fmt::Display for IndicatorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Take-profit / stop-loss tally for one indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRow {
    /// Flag key as it appears in the debug map (`"Unknown"` for numeric keys).
    pub key: String,
    /// Display name (catalog name, or the key itself for ad-hoc rows).
    pub name: String,
    pub tp: u32,
    pub sl: u32,
}

impl IndicatorRow {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            tp: 0,
            sl: 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.tp + self.sl
    }

    pub fn delta(&self) -> i64 {
        i64::from(self.tp) - i64::from(self.sl)
    }

    /// Share of take-profits in percent; 0 when the indicator never fired.
    pub fn accuracy_pct(&self) -> f64 {
        accuracy(self.tp, self.sl)
    }
}

/// Per-group win/loss tally where each signal counts at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub tp: u32,
    pub sl: u32,
}

impl GroupTotals {
    pub fn total(&self) -> u32 {
        self.tp + self.sl
    }

    pub fn delta(&self) -> i64 {
        i64::from(self.tp) - i64::from(self.sl)
    }

    pub fn accuracy_pct(&self) -> f64 {
        accuracy(self.tp, self.sl)
    }
}

/// Everything the indicator section shows for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub group: IndicatorGroup,
    /// Signals with at least one truthy flag in this group (donut).
    pub donut: GroupTotals,
    /// Sums over `rows` (an indicator-weighted count, unlike `donut`).
    pub row_totals: GroupTotals,
    pub rows: Vec<IndicatorRow>,
}

/// Core and support tables side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub core: IndicatorTable,
    pub support: IndicatorTable,
}

fn accuracy(tp: u32, sl: u32) -> f64 {
    let total = tp + sl;
    if total == 0 {
        0.0
    } else {
        f64::from(tp) / f64::from(total) * 100.0
    }
}
