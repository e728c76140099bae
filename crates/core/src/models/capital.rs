use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One normalized row of `capital_log_<date>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalPoint {
    /// Epoch milliseconds (UTC).
    pub timestamp: i64,

    /// The timestamp exactly as it appeared in the log, for display.
    pub time: String,

    /// Account capital at `timestamp`. Always finite.
    pub capital: f64,

    /// Free-form finance metrics attached to the row, if the producer wrote any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

/// Capital change between two consecutive points, tagged with the later timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlBar {
    pub timestamp: i64,
    pub delta: f64,
}

/// One point of the relative equity curve (percent from the first capital value).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub relative_pct: f64,
}
