use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Lifecycle state of a strategy signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalStatus {
    Open,
    Closed,
    /// Anything else the producer wrote (kept upper-cased).
    Other(String),
}

impl SignalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "OPEN" => SignalStatus::Open,
            "CLOSED" => SignalStatus::Closed,
            other => SignalStatus::Other(other.to_string()),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SignalStatus::Closed)
    }
}

impl Default for SignalStatus {
    fn default() -> Self {
        SignalStatus::Other(String::new())
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Open => write!(f, "OPEN"),
            SignalStatus::Closed => write!(f, "CLOSED"),
            SignalStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for SignalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| SignalStatus::parse(&s)).unwrap_or_default())
    }
}

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "LONG" => Some(Side::Long),
            "SHORT" => Some(Side::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A strategy signal as written to `strategy_results_<date>.json`.
///
/// Numeric fields tolerate numbers, numeric strings and `null`; the debug maps
/// are kept raw because producers write them either as objects or as
/// JSON-encoded strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Raw timestamp value; see [`Signal::raw_time`].
    #[serde(default)]
    pub time: Option<Value>,

    #[serde(default)]
    pub timestamp: Option<Value>,

    #[serde(default)]
    pub status: SignalStatus,

    #[serde(default, deserialize_with = "lenient_side")]
    pub side: Option<Side>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub entry: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub exit_price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub tp: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub sl: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_pnl: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub rrr: Option<f64>,

    /// Outcome label such as `"TP HIT"` / `"SL"` (producers use either key).
    #[serde(default, deserialize_with = "lenient_string")]
    pub validated: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub result: Option<String>,

    #[serde(default)]
    pub core_debug: Option<Value>,

    #[serde(default)]
    pub support_debug: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub core_reason: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub support_reason: Option<String>,
}

impl Signal {
    /// The timestamp field the producer filled in (`time`, falling back to `timestamp`).
    pub fn raw_time(&self) -> Option<&Value> {
        [self.time.as_ref(), self.timestamp.as_ref()]
            .into_iter()
            .flatten()
            .find(|v| !is_blank(v))
    }

    /// Net PnL with missing/non-finite values counted as zero.
    pub fn net_pnl_or_zero(&self) -> f64 {
        finite_or_zero(self.net_pnl)
    }

    /// Risk/reward with missing/non-finite values counted as zero.
    pub fn rrr_or_zero(&self) -> f64 {
        finite_or_zero(self.rrr)
    }

    /// A closed trade is a take-profit when its net PnL is strictly positive.
    pub fn is_win(&self) -> bool {
        self.net_pnl_or_zero() > 0.0
    }

    /// Upper-cased outcome label (`validated` first, then `result`).
    pub fn outcome_label(&self) -> String {
        self.validated
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.result.as_deref())
            .unwrap_or("")
            .to_uppercase()
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// Contents of `strategy_results_<date>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyResults {
    #[serde(default)]
    pub signals: Vec<Signal>,

    // ── Optional root-level finance figures ─────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrealized: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected: Option<Value>,
}

impl StrategyResults {
    pub fn closed(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.status.is_closed())
    }
}

// ── Lenient field deserializers ─────────────────────────────────────

/// Coerce a JSON value to a number: numbers as-is, trimmed numeric strings parsed.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(coerce_f64))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_side<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Side>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Side::parse(&s),
        _ => None,
    })
}
