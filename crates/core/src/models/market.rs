use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the latest market signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    None,
}

impl SignalDirection {
    /// Substring match on the upper-cased label: `"STRONG BUY"` is a buy.
    pub fn from_label(label: Option<&str>) -> Self {
        let upper = label.unwrap_or("").to_uppercase();
        if upper.contains("BUY") {
            SignalDirection::Buy
        } else if upper.contains("SELL") {
            SignalDirection::Sell
        } else {
            SignalDirection::None
        }
    }

    pub fn is_actionable(self) -> bool {
        !matches!(self, SignalDirection::None)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "SIGNAL BUY"),
            SignalDirection::Sell => write!(f, "SIGNAL SELL"),
            SignalDirection::None => write!(f, "NO SIGNAL"),
        }
    }
}

/// Colour hint for a value; rendering decides what the tone looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

/// Headline snapshot of the latest `BTC_log` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSignal {
    /// The exact label the producer wrote (`"BUY"`, `"STRONG SELL"`, ...).
    pub raw: Option<String>,
    pub direction: SignalDirection,
    pub price: Option<f64>,
    /// Only filled in when `raw` is exactly BUY or SELL.
    pub entry: Option<f64>,
    pub tp: Option<f64>,
    pub sl: Option<f64>,
}

impl LiveSignal {
    pub fn empty() -> Self {
        Self {
            raw: None,
            direction: SignalDirection::None,
            price: None,
            entry: None,
            tp: None,
            sl: None,
        }
    }
}

/// Timeframes shown in the multi-timeframe panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "4h")]
    H4,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::M5, Timeframe::M30, Timeframe::H4];

    pub fn key(self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M30 => "30m",
            Timeframe::H4 => "4h",
        }
    }
}

/// A value paired with its tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Toned {
    pub value: f64,
    pub tone: Tone,
}

/// Indicator snapshot for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfRow {
    pub timeframe: Timeframe,
    pub direction: SignalDirection,
    pub price: Option<f64>,
    pub rsi: Option<Toned>,
    pub macd: Option<Toned>,
    pub adx: Option<Toned>,
    pub vwap: Option<f64>,
    /// `(ema50, ema200)`, only when both are present.
    pub ema: Option<(f64, f64)>,
    /// `(tenkan, kijun)`, only when both are present.
    pub ichimoku: Option<(f64, f64)>,
    pub atr: Option<f64>,
}
