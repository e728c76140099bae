use serde_json::{Map, Value};

use crate::models::market::{LiveSignal, MtfRow, SignalDirection, Timeframe, Tone, Toned};
use crate::models::signal::coerce_f64;

/// Reads the latest market snapshot out of a `BTC_log` series.
pub struct MarketService;

impl MarketService {
    pub fn new() -> Self {
        Self
    }

    /// Headline signal of the last snapshot. Entry, TP and SL are only
    /// reported for an exact BUY/SELL label; entry falls back to price.
    pub fn live_signal(&self, snapshots: &[Value]) -> LiveSignal {
        let Some(last) = snapshots.last().and_then(Value::as_object) else {
            return LiveSignal::empty();
        };

        let raw = last
            .get("signal")
            .and_then(Value::as_str)
            .map(|s| s.to_uppercase())
            .filter(|s| !s.is_empty());
        let direction = SignalDirection::from_label(raw.as_deref());
        let price = number(last, "price");

        let (entry, tp, sl) = match raw.as_deref() {
            Some("BUY") | Some("SELL") => (
                number(last, "entry").or(price),
                number(last, "tp"),
                number(last, "sl"),
            ),
            _ => (None, None, None),
        };

        LiveSignal {
            raw,
            direction,
            price,
            entry,
            tp,
            sl,
        }
    }

    /// Per-timeframe indicator rows of the last snapshot; empty without data.
    ///
    /// Reads `multi_tf_context.snapshots.<tf>`, falling back to the legacy
    /// `tf<tf>` key on the record itself.
    pub fn mtf_rows(&self, snapshots: &[Value]) -> Vec<MtfRow> {
        let Some(last) = snapshots.last().and_then(Value::as_object) else {
            return Vec::new();
        };
        let nested = last
            .get("multi_tf_context")
            .and_then(|c| c.get("snapshots"))
            .and_then(Value::as_object);

        let empty = Map::new();
        Timeframe::ALL
            .iter()
            .map(|tf| {
                let snap = nested
                    .and_then(|n| n.get(tf.key()))
                    .and_then(Value::as_object)
                    .or_else(|| last.get(&format!("tf{}", tf.key())).and_then(Value::as_object))
                    .unwrap_or(&empty);
                self.mtf_row(*tf, snap)
            })
            .collect()
    }

    fn mtf_row(&self, timeframe: Timeframe, snap: &Map<String, Value>) -> MtfRow {
        let pair = |a: &str, b: &str| number(snap, a).zip(number(snap, b));
        MtfRow {
            timeframe,
            direction: SignalDirection::from_label(snap.get("signal").and_then(Value::as_str)),
            price: number(snap, "price"),
            rsi: number(snap, "rsi").map(|v| Toned { value: v, tone: rsi_tone(v) }),
            macd: number(snap, "macd").map(|v| Toned {
                value: v,
                tone: if v >= 0.0 { Tone::Positive } else { Tone::Negative },
            }),
            adx: number(snap, "adx").map(|v| Toned {
                value: v,
                tone: if v >= 25.0 { Tone::Positive } else { Tone::Neutral },
            }),
            vwap: number(snap, "vwap"),
            ema: pair("ema50", "ema200"),
            ichimoku: pair("tenkan", "kijun"),
            atr: number(snap, "atr"),
        }
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}

/// RSI above 55 reads bullish, below 45 bearish.
pub fn rsi_tone(rsi: f64) -> Tone {
    if rsi >= 55.0 {
        Tone::Positive
    } else if rsi <= 45.0 {
        Tone::Negative
    } else {
        Tone::Neutral
    }
}

fn number(record: &Map<String, Value>, key: &str) -> Option<f64> {
    record
        .get(key)
        .and_then(coerce_f64)
        .filter(|v| v.is_finite())
}
